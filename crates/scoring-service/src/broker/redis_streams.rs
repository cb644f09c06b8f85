//! Redis Streams transport.
//!
//! Every channel is a stream whose entries carry the JSON document in the
//! `payload` field. Input is read through a consumer group with `NOACK`, so
//! delivered entries count as consumed (auto-commit, at-most-once per group).
//! Reads and publishes use separate connections so a blocking `XREADGROUP`
//! never delays an `XADD`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::streams::{StreamId, StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use tracing::{debug, info};

use super::{BrokerChannels, ChannelProvider, Connection, MessageConsumer, MessagePublisher, RawMessage};
use crate::config::BrokerConfig;
use crate::errors::BrokerError;

/// Stream entry field holding the JSON document.
pub const PAYLOAD_FIELD: &str = "payload";

/// Start id for a newly created group: read the stream from the beginning.
const GROUP_START_ID: &str = "0";

/// Connects to Redis and hands out stream consumer/publisher halves.
#[derive(Debug, Clone)]
pub struct RedisStreamsProvider {
    config: BrokerConfig,
}

impl RedisStreamsProvider {
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ChannelProvider for RedisStreamsProvider {
    fn name(&self) -> &'static str {
        "redis-streams"
    }

    async fn connect(&self) -> Result<Connection, BrokerError> {
        let client = redis::Client::open(self.config.url.as_str())?;

        let mut read_conn = client.get_multiplexed_async_connection().await?;
        ensure_group(
            &mut read_conn,
            &self.config.input_channel,
            &self.config.consumer_group,
        )
        .await?;

        let write_conn = client.get_multiplexed_async_connection().await?;

        info!(
            stream = %self.config.input_channel,
            group = %self.config.consumer_group,
            consumer = %self.config.consumer_name,
            "Redis Streams connected"
        );

        Ok(Connection::Ready(BrokerChannels {
            consumer: Box::new(RedisStreamConsumer {
                conn: read_conn,
                stream: self.config.input_channel.clone(),
                group: self.config.consumer_group.clone(),
                consumer: self.config.consumer_name.clone(),
                batch_size: self.config.batch_size,
            }),
            publisher: Arc::new(RedisStreamPublisher { conn: write_conn }),
        }))
    }
}

/// Create the consumer group (and stream) unless it already exists.
async fn ensure_group(
    conn: &mut MultiplexedConnection,
    stream: &str,
    group: &str,
) -> Result<(), BrokerError> {
    let created: redis::RedisResult<()> = conn
        .xgroup_create_mkstream(stream, group, GROUP_START_ID)
        .await;

    match created {
        Ok(()) => {
            info!(stream, group, "created consumer group");
            Ok(())
        }
        Err(e) if e.code() == Some("BUSYGROUP") => {
            debug!(stream, group, "consumer group already exists");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

// ---------------------------------------------------------------------------
// Consumer
// ---------------------------------------------------------------------------

struct RedisStreamConsumer {
    conn: MultiplexedConnection,
    stream: String,
    group: String,
    consumer: String,
    batch_size: usize,
}

#[async_trait]
impl MessageConsumer for RedisStreamConsumer {
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<RawMessage>, BrokerError> {
        let opts = StreamReadOptions::default()
            .group(&self.group, &self.consumer)
            .count(self.batch_size)
            .block(timeout.as_millis() as usize)
            .noack();

        // Nil reply when the block timeout elapses with nothing new.
        let reply: Option<StreamReadReply> = self
            .conn
            .xread_options(&[&self.stream], &[">"], &opts)
            .await?;

        let Some(reply) = reply else {
            return Ok(Vec::new());
        };

        Ok(reply
            .keys
            .into_iter()
            .flat_map(|key| key.ids)
            .map(raw_message)
            .collect())
    }
}

/// Convert a stream entry; a missing `payload` field yields an empty payload.
fn raw_message(entry: StreamId) -> RawMessage {
    let payload: Vec<u8> = entry.get(PAYLOAD_FIELD).unwrap_or_default();
    RawMessage {
        id: entry.id,
        payload,
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

struct RedisStreamPublisher {
    conn: MultiplexedConnection,
}

#[async_trait]
impl MessagePublisher for RedisStreamPublisher {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BrokerError> {
        // Multiplexed connections are cheap handles onto one socket.
        let mut conn = self.conn.clone();
        let id: String = conn.xadd(channel, "*", &[(PAYLOAD_FIELD, payload)]).await?;
        debug!(channel, id = %id, bytes = payload.len(), "published entry");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use std::collections::HashMap;

    fn entry(id: &str, fields: &[(&str, &[u8])]) -> StreamId {
        StreamId {
            id: id.to_string(),
            map: fields
                .iter()
                .map(|(k, v)| (k.to_string(), redis::Value::BulkString(v.to_vec())))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_entry_with_payload() {
        let raw = raw_message(entry("1700000000000-0", &[(PAYLOAD_FIELD, &b"{\"a\":1}"[..])]));
        assert_eq!(raw.id, "1700000000000-0");
        assert_eq!(raw.payload, b"{\"a\":1}");
    }

    #[test]
    fn test_entry_without_payload_is_empty() {
        let raw = raw_message(entry("1700000000000-1", &[("body", &b"{}"[..])]));
        assert_eq!(raw.id, "1700000000000-1");
        assert!(raw.payload.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_is_transport_error() {
        let mut config = ServiceConfig::from_lookup(|_| None).unwrap().broker;
        config.enabled = true;
        config.url = "not-a-redis-url".into();

        let result = RedisStreamsProvider::new(config).connect().await;
        match result {
            Err(e) => assert_eq!(e.kind(), "RedisError"),
            Ok(_) => panic!("invalid URL must not connect"),
        }
    }
}
