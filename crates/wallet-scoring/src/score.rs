//! Mapping of DEX features onto a bounded score.

use crate::types::DexFeatures;

/// Lowest possible score.
pub const MIN_SCORE: f64 = 0.0;
/// Highest possible score.
pub const MAX_SCORE: f64 = 1000.0;

/// A pure scoring rule over extracted features.
///
/// Implementations must return a value in `[MIN_SCORE, MAX_SCORE]` and depend
/// on nothing but the features.
pub trait ScoreFunction: Send + Sync {
    fn score(&self, features: &DexFeatures) -> f64;
}

/// Placeholder linear rule until a calibrated model replaces it.
///
/// Deposits contribute up to 500, half the swap volume up to 400, and every
/// distinct pool 50. Withdrawals and raw counts are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderDexScore;

const DEPOSIT_CAP: f64 = 500.0;
const SWAP_CAP: f64 = 400.0;
const SWAP_DIVISOR: f64 = 2.0;
const POOL_WEIGHT: f64 = 50.0;

impl ScoreFunction for PlaceholderDexScore {
    fn score(&self, features: &DexFeatures) -> f64 {
        let deposit_term = features.total_deposit_usd.min(DEPOSIT_CAP);
        let swap_term = (features.total_swap_volume / SWAP_DIVISOR).min(SWAP_CAP);
        let pool_term = POOL_WEIGHT * features.unique_pools;

        let total = deposit_term + swap_term + pool_term;
        if total.is_nan() {
            return MIN_SCORE;
        }
        total.clamp(MIN_SCORE, MAX_SCORE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn features(deposit: f64, swap: f64, pools: f64) -> DexFeatures {
        DexFeatures {
            total_deposit_usd: deposit,
            total_swap_volume: swap,
            unique_pools: pools,
            ..Default::default()
        }
    }

    #[test]
    fn test_reference_score() {
        let score = PlaceholderDexScore.score(&features(500.0, 1000.0, 1.0));
        assert_eq!(score, 950.0);
    }

    #[test]
    fn test_terms_are_capped() {
        assert_eq!(PlaceholderDexScore.score(&features(10_000.0, 0.0, 0.0)), 500.0);
        assert_eq!(PlaceholderDexScore.score(&features(0.0, 10_000.0, 0.0)), 400.0);
        assert_eq!(PlaceholderDexScore.score(&features(0.0, 300.0, 0.0)), 150.0);
    }

    #[test]
    fn test_total_clamped_to_range() {
        assert_eq!(PlaceholderDexScore.score(&features(500.0, 800.0, 40.0)), MAX_SCORE);
        assert_eq!(PlaceholderDexScore.score(&features(-900.0, 0.0, 0.0)), MIN_SCORE);
        assert_eq!(PlaceholderDexScore.score(&DexFeatures::default()), MIN_SCORE);
    }

    #[test]
    fn test_ignored_features() {
        let base = features(100.0, 100.0, 1.0);
        let noisy = DexFeatures {
            total_withdraw_usd: 1e9,
            num_deposits: 12.0,
            num_withdraws: 40.0,
            num_swaps: 99.0,
            ..base
        };
        assert_eq!(PlaceholderDexScore.score(&base), PlaceholderDexScore.score(&noisy));
    }

    #[test]
    fn test_nan_features_score_zero() {
        let score = PlaceholderDexScore.score(&features(0.0, 0.0, f64::NAN));
        assert_eq!(score, MIN_SCORE);
    }

    proptest! {
        #[test]
        fn score_within_bounds(
            deposit in 0.0f64..1e9,
            swap in 0.0f64..1e9,
            pools in 0u32..1000u32,
        ) {
            let s = PlaceholderDexScore.score(&features(deposit, swap, pools as f64));
            prop_assert!((MIN_SCORE..=MAX_SCORE).contains(&s));
        }

        #[test]
        fn score_monotonic_in_each_driver(
            deposit in 0.0f64..2000.0,
            swap in 0.0f64..2000.0,
            pools in 0u32..30u32,
            delta in 0.0f64..1000.0,
            extra_pools in 0u32..5u32,
        ) {
            let base = PlaceholderDexScore.score(&features(deposit, swap, pools as f64));
            let more_deposit = PlaceholderDexScore.score(&features(deposit + delta, swap, pools as f64));
            let more_swap = PlaceholderDexScore.score(&features(deposit, swap + delta, pools as f64));
            let more_pools =
                PlaceholderDexScore.score(&features(deposit, swap, (pools + extra_pools) as f64));
            prop_assert!(more_deposit >= base);
            prop_assert!(more_swap >= base);
            prop_assert!(more_pools >= base);
        }
    }
}
