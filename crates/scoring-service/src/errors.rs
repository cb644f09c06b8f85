use thiserror::Error;
use wallet_scoring::ScoringError;

/// Failures of the message broker transport.
#[derive(Error, Debug)]
pub enum BrokerError {
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    #[error("broker channel closed: {0}")]
    Closed(String),
}

impl BrokerError {
    pub fn kind(&self) -> &'static str {
        match self {
            BrokerError::Redis(_) => "RedisError",
            BrokerError::Closed(_) => "ChannelClosed",
        }
    }
}

/// Per-message failure inside the ingestion loop.
///
/// Every variant is recovered locally: the message is routed to the failure
/// channel and the loop continues.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to publish result: {0}")]
    Publish(#[from] BrokerError),
}

impl IngestError {
    /// Failure kind used as the prefix of the failure description.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Scoring(e) => e.kind(),
            IngestError::Encode(_) => "EncodeError",
            IngestError::Publish(_) => "PublishError",
        }
    }

    /// `"<Kind>: <message>"`, as carried by failure payloads.
    pub fn describe(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_schema_error() {
        let serde_err = serde_json::from_str::<wallet_scoring::types::WalletMessage>("{}")
            .unwrap_err();
        let err = IngestError::from(ScoringError::from(serde_err));
        let text = err.describe();
        assert!(text.starts_with("SchemaError: invalid wallet message:"), "{text}");
    }

    #[test]
    fn test_describe_publish_error() {
        let err = IngestError::from(BrokerError::Closed("wallet-scores-success".into()));
        assert_eq!(
            err.describe(),
            "PublishError: failed to publish result: broker channel closed: wallet-scores-success"
        );
    }
}
