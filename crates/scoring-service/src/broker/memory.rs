//! In-process broker used to drive the ingestion loop in tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{BrokerChannels, ChannelProvider, Connection, MessageConsumer, MessagePublisher, RawMessage};
use crate::errors::BrokerError;

/// Longest a poll on an empty queue sleeps, so tests stay fast.
const MAX_IDLE_POLL: Duration = Duration::from_millis(5);

#[derive(Debug, Default)]
pub struct MemoryBroker {
    inbound: Mutex<VecDeque<RawMessage>>,
    published: Mutex<Vec<(String, String)>>,
    failing: Mutex<HashSet<String>>,
    next_id: AtomicU64,
}

impl MemoryBroker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, payload: impl Into<Vec<u8>>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.inbound.lock().unwrap().push_back(RawMessage {
            id: format!("{id}-0"),
            payload: payload.into(),
        });
    }

    /// Make every publish to `channel` fail.
    pub fn fail_channel(&self, channel: &str) {
        self.failing.lock().unwrap().insert(channel.to_string());
    }

    /// Payloads published to `channel`, in publish order.
    pub fn published(&self, channel: &str) -> Vec<String> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(ch, _)| ch == channel)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    pub fn published_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }

    pub fn pending(&self) -> usize {
        self.inbound.lock().unwrap().len()
    }
}

/// Provider handing out channels backed by a [`MemoryBroker`].
pub struct MemoryProvider {
    broker: Arc<MemoryBroker>,
    batch_size: usize,
}

impl MemoryProvider {
    pub fn new(broker: Arc<MemoryBroker>, batch_size: usize) -> Self {
        Self { broker, batch_size }
    }
}

#[async_trait]
impl ChannelProvider for MemoryProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self) -> Result<Connection, BrokerError> {
        Ok(Connection::Ready(BrokerChannels {
            consumer: Box::new(MemoryConsumer {
                broker: self.broker.clone(),
                batch_size: self.batch_size,
            }),
            publisher: Arc::new(MemoryPublisher {
                broker: self.broker.clone(),
            }),
        }))
    }
}

/// Provider whose connection attempt always fails.
pub struct UnreachableProvider;

#[async_trait]
impl ChannelProvider for UnreachableProvider {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn connect(&self) -> Result<Connection, BrokerError> {
        Err(BrokerError::Closed("connection refused".into()))
    }
}

struct MemoryConsumer {
    broker: Arc<MemoryBroker>,
    batch_size: usize,
}

#[async_trait]
impl MessageConsumer for MemoryConsumer {
    async fn poll(&mut self, timeout: Duration) -> Result<Vec<RawMessage>, BrokerError> {
        let batch: Vec<RawMessage> = {
            let mut inbound = self.broker.inbound.lock().unwrap();
            let n = inbound.len().min(self.batch_size);
            inbound.drain(..n).collect()
        };
        if batch.is_empty() {
            tokio::time::sleep(timeout.min(MAX_IDLE_POLL)).await;
        }
        Ok(batch)
    }
}

struct MemoryPublisher {
    broker: Arc<MemoryBroker>,
}

#[async_trait]
impl MessagePublisher for MemoryPublisher {
    async fn publish(&self, channel: &str, payload: &str) -> Result<(), BrokerError> {
        if self.broker.failing.lock().unwrap().contains(channel) {
            return Err(BrokerError::Closed(channel.to_string()));
        }
        self.broker
            .published
            .lock()
            .unwrap()
            .push((channel.to_string(), payload.to_string()));
        Ok(())
    }
}
