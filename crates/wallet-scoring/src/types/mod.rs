//! Wire types for the scoring pipeline.

pub mod output;
pub mod partial;
pub mod wallet;

pub use output::{CategoryFailure, CategorySuccess, DexFeatures, FailureMessage, SuccessMessage};
pub use partial::{Lenient, PartialProtocolData, PartialWalletMessage};
pub use wallet::{ProtocolData, TokenAmount, Transaction, WalletMessage};
