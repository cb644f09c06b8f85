use async_trait::async_trait;

use super::{ChannelProvider, Connection};
use crate::errors::BrokerError;

/// Provider used when the broker integration is turned off.
#[derive(Debug, Clone)]
pub struct DisabledProvider {
    reason: String,
}

impl DisabledProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ChannelProvider for DisabledProvider {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn connect(&self) -> Result<Connection, BrokerError> {
        Ok(Connection::Disabled {
            reason: self.reason.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_never_connects() {
        let provider = DisabledProvider::new("ENABLE_BROKER=false");
        match provider.connect().await.unwrap() {
            Connection::Disabled { reason } => assert_eq!(reason, "ENABLE_BROKER=false"),
            Connection::Ready(_) => panic!("disabled provider must not connect"),
        }
    }
}
