//! Outbound payloads published to the success and failure channels.

use serde::{Deserialize, Serialize};

use crate::DEX_CATEGORY;

/// Error tag carried by every failed category.
pub const PROCESSING_FAILED: &str = "processing_failed";

// ---------------------------------------------------------------------------
// Features
// ---------------------------------------------------------------------------

/// Aggregates extracted from a wallet's DEX transactions.
///
/// Counts are whole numbers kept as `f64` so every feature shares one numeric
/// type on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DexFeatures {
    pub total_deposit_usd: f64,
    pub total_withdraw_usd: f64,
    pub num_deposits: f64,
    pub num_withdraws: f64,
    pub total_swap_volume: f64,
    pub num_swaps: f64,
    pub unique_pools: f64,
}

// ---------------------------------------------------------------------------
// Success
// ---------------------------------------------------------------------------

/// Scored result for one category of a wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySuccess {
    pub category: String,
    pub score: f64,
    pub transaction_count: usize,
    pub features: DexFeatures,
}

/// Published when a wallet message was scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessMessage {
    pub wallet_address: String,
    /// Score rendered with 18 fractional digits.
    pub zscore: String,
    pub timestamp: i64,
    pub processing_time_ms: u64,
    pub categories: Vec<CategorySuccess>,
}

// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFailure {
    pub category: String,
    pub error: String,
    pub transaction_count: usize,
}

/// Published when a raw message could not be scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureMessage {
    /// Empty when the raw payload carried no usable address.
    pub wallet_address: String,
    pub error: String,
    pub timestamp: i64,
    pub processing_time_ms: u64,
    pub categories: Vec<CategoryFailure>,
}

impl FailureMessage {
    /// Single-category DEX failure.
    pub fn dex(
        wallet_address: String,
        error: String,
        transaction_count: usize,
        timestamp: i64,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            wallet_address,
            error,
            timestamp,
            processing_time_ms,
            categories: vec![CategoryFailure {
                category: DEX_CATEGORY.to_string(),
                error: PROCESSING_FAILED.to_string(),
                transaction_count,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_serialize_with_fixed_keys() {
        let features = DexFeatures {
            total_deposit_usd: 500.0,
            num_deposits: 1.0,
            ..Default::default()
        };
        let json = serde_json::to_value(features).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        let mut expected = vec![
            "total_deposit_usd",
            "total_withdraw_usd",
            "num_deposits",
            "num_withdraws",
            "total_swap_volume",
            "num_swaps",
            "unique_pools",
        ];
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        expected.sort_unstable();
        assert_eq!(sorted, expected);
        assert_eq!(json["total_deposit_usd"], 500.0);
    }

    #[test]
    fn test_failure_shape() {
        let failure = FailureMessage::dex(String::new(), "SchemaError: bad".into(), 3, 10, 2);
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["wallet_address"], "");
        assert_eq!(json["categories"][0]["category"], "dexes");
        assert_eq!(json["categories"][0]["error"], "processing_failed");
        assert_eq!(json["categories"][0]["transaction_count"], 3);
        assert_eq!(json["processing_time_ms"], 2);
    }
}
