//! Fixed-precision rendering of scores.
//!
//! Scores are published as decimal strings so downstream consumers comparing
//! or storing them as text never see binary floating-point drift.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::ScoringError;

/// Digits kept after the decimal point.
pub const ZSCORE_DECIMALS: u32 = 18;

/// Render `score` with exactly [`ZSCORE_DECIMALS`] fractional digits,
/// rounding half-up at the last digit.
pub fn format_zscore(score: f64) -> Result<String, ScoringError> {
    let mut value = Decimal::from_f64_retain(score)
        .ok_or(ScoringError::NonFiniteScore { value: score })?
        .round_dp_with_strategy(ZSCORE_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(ZSCORE_DECIMALS);
    Ok(value.to_string())
}
