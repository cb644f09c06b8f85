//! Best-effort view of a raw payload that failed validation.
//!
//! Every field is optional and lenient: a field holding the wrong JSON type
//! reads as absent instead of failing the whole payload. Used only to fill in
//! the failure message for input that [`WalletMessage`](super::WalletMessage)
//! rejected.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer};

use super::output::FailureMessage;

/// Field wrapper that turns a type mismatch into absence.
#[derive(Debug, Clone, PartialEq)]
pub struct Lenient<T>(pub Option<T>);

impl<T> Default for Lenient<T> {
    fn default() -> Self {
        Lenient(None)
    }
}

impl<T> Lenient<T> {
    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Lenient<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Lenient(T::deserialize(value).ok()))
    }
}

/// Partially-typed wallet message.
#[derive(Debug, Default, Deserialize)]
pub struct PartialWalletMessage {
    #[serde(default)]
    pub wallet_address: Lenient<String>,
    #[serde(default)]
    pub data: Lenient<Vec<Lenient<PartialProtocolData>>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PartialProtocolData {
    /// Elements are counted, never inspected.
    #[serde(default)]
    pub transactions: Lenient<Vec<IgnoredAny>>,
}

impl PartialWalletMessage {
    /// Read whatever is reachable from a raw payload. Non-JSON and non-object
    /// payloads yield an empty view.
    pub fn from_raw(payload: &[u8]) -> Self {
        match serde_json::from_slice::<serde_json::Value>(payload) {
            Ok(value) if value.is_object() => {
                serde_json::from_value(value).unwrap_or_default()
            }
            _ => Self::default(),
        }
    }

    /// Wallet address, or an empty string when absent or not a string.
    pub fn wallet_address(&self) -> String {
        self.wallet_address.get().cloned().unwrap_or_default()
    }

    /// Length of the first data block's transaction list, 0 when unreachable.
    pub fn transaction_count(&self) -> usize {
        self.data
            .get()
            .and_then(|blocks| blocks.first())
            .and_then(Lenient::get)
            .and_then(|block| block.transactions.get())
            .map_or(0, Vec::len)
    }

    /// Build the DEX failure message for this payload.
    pub fn into_failure(
        self,
        error: String,
        timestamp: i64,
        processing_time_ms: u64,
    ) -> FailureMessage {
        FailureMessage::dex(
            self.wallet_address(),
            error,
            self.transaction_count(),
            timestamp,
            processing_time_ms,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
