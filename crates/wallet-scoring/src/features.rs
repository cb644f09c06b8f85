//! Feature extraction over a wallet's DEX transactions.
//!
//! A single pass accumulates deposit, withdraw and swap totals plus the set of
//! distinct pools touched. Transactions with an unrecognized action still
//! count towards `unique_pools` but touch no other aggregate.

use std::collections::HashSet;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::wallet::{usd_or_zero, DexAction};
use crate::types::{DexFeatures, Transaction};

/// Decimal places kept on USD totals.
const USD_DECIMALS: u32 = 6;

/// Aggregate a transaction sequence into [`DexFeatures`].
pub fn extract_dex_features(transactions: &[Transaction]) -> DexFeatures {
    let mut total_deposit_usd = 0.0;
    let mut total_withdraw_usd = 0.0;
    let mut total_swap_volume = 0.0;
    let mut num_deposits = 0u64;
    let mut num_withdraws = 0u64;
    let mut num_swaps = 0u64;
    let mut pools: HashSet<&str> = HashSet::new();

    for tx in transactions {
        if let Some(pool) = tx.pool() {
            pools.insert(pool);
        }

        match tx.dex_action() {
            Some(DexAction::Deposit) => {
                total_deposit_usd += liquidity_usd(tx);
                num_deposits += 1;
            }
            Some(DexAction::Withdraw) => {
                total_withdraw_usd += liquidity_usd(tx);
                num_withdraws += 1;
            }
            Some(DexAction::Swap) => {
                // Prefer the input leg, fall back to the output leg.
                total_swap_volume += tx
                    .token_in
                    .as_ref()
                    .and_then(|t| t.nonzero_usd())
                    .or_else(|| tx.token_out.as_ref().and_then(|t| t.nonzero_usd()))
                    .unwrap_or(0.0);
                num_swaps += 1;
            }
            None => {}
        }
    }

    DexFeatures {
        total_deposit_usd: round_to(total_deposit_usd, USD_DECIMALS),
        total_withdraw_usd: round_to(total_withdraw_usd, USD_DECIMALS),
        num_deposits: num_deposits as f64,
        num_withdraws: num_withdraws as f64,
        total_swap_volume: round_to(total_swap_volume, USD_DECIMALS),
        num_swaps: num_swaps as f64,
        unique_pools: pools.len() as f64,
    }
}

/// Combined USD value of both liquidity legs.
fn liquidity_usd(tx: &Transaction) -> f64 {
    usd_or_zero(tx.token0.as_ref()) + usd_or_zero(tx.token1.as_ref())
}

/// Round to `places` decimals, ties to even, on the exact binary value.
///
/// Magnitudes beyond the decimal range are returned unchanged above 1 and
/// as zero below it.
pub(crate) fn round_to(value: f64, places: u32) -> f64 {
    match Decimal::from_f64_retain(value) {
        Some(exact) => exact
            .round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
            .to_f64()
            .unwrap_or(value),
        None if value.abs() < 1.0 => 0.0,
        None => value,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
