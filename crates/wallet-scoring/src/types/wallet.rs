//! Inbound wallet activity, as produced by the upstream indexer.

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Token amounts
// ---------------------------------------------------------------------------

/// One side of a swap or liquidity action.
///
/// Numeric fields accept JSON numbers and numeric strings. Anything else
/// (null, booleans, garbage text, non-finite values) reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenAmount {
    #[serde(default, deserialize_with = "lenient_number")]
    pub amount: Option<f64>,
    #[serde(rename = "amountUSD", default, deserialize_with = "lenient_number")]
    pub amount_usd: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

impl TokenAmount {
    /// USD value if present and non-zero.
    pub fn nonzero_usd(&self) -> Option<f64> {
        self.amount_usd.filter(|usd| *usd != 0.0)
    }
}

/// USD value of an optional token leg, 0 when the leg or its value is absent.
pub(crate) fn usd_or_zero(token: Option<&TokenAmount>) -> f64 {
    token.and_then(TokenAmount::nonzero_usd).unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// A single DEX transaction of a wallet.
///
/// Deposits and withdrawals carry `token0`/`token1`, swaps carry
/// `tokenIn`/`tokenOut`. No combination of present or absent legs is
/// rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub document_id: Option<String>,
    /// Free-form action, compared case-insensitively.
    pub action: String,
    pub timestamp: i64,
    #[serde(default)]
    pub caller: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(rename = "poolId", default)]
    pub pool_id: Option<String>,
    #[serde(rename = "poolName", default)]
    pub pool_name: Option<String>,

    // Swap legs.
    #[serde(rename = "tokenIn", default)]
    pub token_in: Option<TokenAmount>,
    #[serde(rename = "tokenOut", default)]
    pub token_out: Option<TokenAmount>,

    // Liquidity legs.
    #[serde(default)]
    pub token0: Option<TokenAmount>,
    #[serde(default)]
    pub token1: Option<TokenAmount>,
}

/// Recognized transaction actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DexAction {
    Deposit,
    Withdraw,
    Swap,
}

impl Transaction {
    /// Classify the free-form action. Unknown actions yield `None`.
    pub fn dex_action(&self) -> Option<DexAction> {
        let action = self.action.to_lowercase();
        match action.as_str() {
            "deposit" => Some(DexAction::Deposit),
            "withdraw" => Some(DexAction::Withdraw),
            "swap" => Some(DexAction::Swap),
            _ => None,
        }
    }

    /// Pool identifier, if present and non-empty.
    pub fn pool(&self) -> Option<&str> {
        self.pool_id.as_deref().filter(|id| !id.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Transactions of one protocol family (e.g. `"dexes"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolData {
    #[serde(rename = "protocolType")]
    pub protocol_type: String,
    pub transactions: Vec<Transaction>,
}

/// Inbound message: all activity of one wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletMessage {
    pub wallet_address: String,
    pub data: Vec<ProtocolData>,
}

impl WalletMessage {
    /// First block whose protocol type matches `protocol_type`, ignoring case.
    pub fn protocol_block(&self, protocol_type: &str) -> Option<&ProtocolData> {
        self.data
            .iter()
            .find(|block| block.protocol_type.eq_ignore_ascii_case(protocol_type))
    }
}

// ---------------------------------------------------------------------------
// Lenient numbers
// ---------------------------------------------------------------------------

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    let value = match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Some(n),
        NumberOrText::Text(text) => text.trim().parse::<f64>().ok(),
        NumberOrText::Other(_) => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
