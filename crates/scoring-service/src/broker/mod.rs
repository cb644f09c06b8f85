//! Pluggable message channels.
//!
//! The ingestion loop only sees the traits below. A provider is selected once
//! at startup from configuration: [`DisabledProvider`] when the broker is
//! turned off, [`RedisStreamsProvider`] otherwise.

pub mod disabled;
#[cfg(test)]
pub mod memory;
pub mod redis_streams;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use disabled::DisabledProvider;
pub use redis_streams::RedisStreamsProvider;

use crate::config::{BrokerConfig, ENABLE_BROKER_VAR};
use crate::errors::BrokerError;

/// One inbound message as delivered by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Broker-assigned entry id.
    pub id: String,
    /// Raw JSON document; empty when the entry carried none.
    pub payload: Vec<u8>,
}

/// Reads batches from the input channel.
#[async_trait]
pub trait MessageConsumer: Send {
    /// Wait at most `timeout` for a batch. An empty batch means nothing
    /// arrived in time.
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<RawMessage>, BrokerError>;
}

/// Appends JSON documents to output channels.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BrokerError>;
}

/// A connected consumer/publisher pair.
pub struct BrokerChannels {
    pub consumer: Box<dyn MessageConsumer>,
    pub publisher: Arc<dyn MessagePublisher>,
}

/// Outcome of asking a provider to connect.
pub enum Connection {
    /// Integration turned off; nothing to poll.
    Disabled { reason: String },
    Ready(BrokerChannels),
}

/// Source of broker channels.
#[async_trait]
pub trait ChannelProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    async fn connect(&self) -> Result<Connection, BrokerError>;
}

/// Pick the provider for this process.
pub fn select_provider(config: &BrokerConfig) -> Box<dyn ChannelProvider> {
    if config.enabled {
        Box::new(RedisStreamsProvider::new(config.clone()))
    } else {
        Box::new(DisabledProvider::new(format!("{ENABLE_BROKER_VAR}=false")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;

    #[test]
    fn test_select_provider_follows_flag() {
        let mut config = ServiceConfig::from_lookup(|_| None).unwrap().broker;
        assert_eq!(select_provider(&config).name(), "disabled");

        config.enabled = true;
        assert_eq!(select_provider(&config).name(), "redis-streams");
    }
}
