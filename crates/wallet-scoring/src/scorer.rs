//! Per-wallet orchestration: locate DEX data, extract, score, format.

use tracing::trace;

use crate::errors::ScoringError;
use crate::features::{extract_dex_features, round_to};
use crate::format::format_zscore;
use crate::score::{PlaceholderDexScore, ScoreFunction};
use crate::types::{CategorySuccess, SuccessMessage, WalletMessage};
use crate::DEX_CATEGORY;

/// Decimal places of the per-category score.
const CATEGORY_SCORE_DECIMALS: u32 = 2;

/// Scores wallet messages with a pluggable [`ScoreFunction`].
#[derive(Debug, Clone)]
pub struct WalletScorer<S = PlaceholderDexScore> {
    score_fn: S,
}

impl WalletScorer {
    /// Scorer backed by [`PlaceholderDexScore`].
    pub fn placeholder() -> Self {
        Self::new(PlaceholderDexScore)
    }
}

impl Default for WalletScorer {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl<S: ScoreFunction> WalletScorer<S> {
    pub fn new(score_fn: S) -> Self {
        Self { score_fn }
    }

    /// Parse a raw JSON payload and score it.
    pub fn score_payload(&self, payload: &[u8]) -> Result<SuccessMessage, ScoringError> {
        let message: WalletMessage = serde_json::from_slice(payload)?;
        self.score_wallet(&message)
    }

    /// Score the first `"dexes"` block of a wallet message.
    ///
    /// A message without DEX data scores an empty history. The returned
    /// message has `processing_time_ms` set to 0; the caller owns timing.
    pub fn score_wallet(&self, message: &WalletMessage) -> Result<SuccessMessage, ScoringError> {
        let transactions = message
            .protocol_block(DEX_CATEGORY)
            .map(|block| block.transactions.as_slice())
            .unwrap_or_default();

        let features = extract_dex_features(transactions);
        let score = self.score_fn.score(&features);
        let zscore = format_zscore(score)?;

        // First transaction's timestamp; 0 for an empty history.
        let timestamp = transactions.first().map_or(0, |tx| tx.timestamp);

        trace!(
            wallet = %message.wallet_address,
            transactions = transactions.len(),
            score,
            "scored wallet"
        );

        Ok(SuccessMessage {
            wallet_address: message.wallet_address.clone(),
            zscore,
            timestamp,
            processing_time_ms: 0,
            categories: vec![CategorySuccess {
                category: DEX_CATEGORY.to_string(),
                score: round_to(score, CATEGORY_SCORE_DECIMALS),
                transaction_count: transactions.len(),
                features,
            }],
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
