//! Wallet DEX activity scoring.
//!
//! Turns the DEX transactions of a [`WalletMessage`](types::WalletMessage)
//! into a fixed feature set, maps the features onto a bounded score and
//! renders the result as the success payload published downstream. Failure
//! payloads for malformed input are built from a lenient partial view of the
//! raw message.

pub mod errors;
pub mod features;
pub mod format;
pub mod score;
pub mod scorer;
pub mod types;

pub use errors::ScoringError;
pub use features::extract_dex_features;
pub use format::format_zscore;
pub use score::{PlaceholderDexScore, ScoreFunction};
pub use scorer::WalletScorer;

/// Category tag of every DEX result.
pub const DEX_CATEGORY: &str = "dexes";
