//! Ingestion status for external inspection.
//!
//! Written only by the ingestion startup sequence; everything else reads
//! snapshots.

use std::sync::{Arc, RwLock};

use serde::Serialize;

/// Lifecycle state of the ingestion loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionState {
    /// Turned off by configuration or failed to initialize.
    Disabled,
    /// Polling the input channel.
    Running,
}

#[derive(Debug)]
struct StatusInner {
    enabled: bool,
    state: IngestionState,
    reason: Option<String>,
}

/// Serializable view served by the status surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Broker integration enabled by configuration.
    pub enabled: bool,
    pub running: bool,
    /// Why ingestion is not running, if it isn't.
    pub reason: Option<String>,
}

/// Thread-safe handle to the ingestion status.
#[derive(Debug, Clone)]
pub struct IngestionStatus {
    inner: Arc<RwLock<StatusInner>>,
}

impl IngestionStatus {
    /// Fresh status: disabled until startup says otherwise.
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StatusInner {
                enabled,
                state: IngestionState::Disabled,
                reason: None,
            })),
        }
    }

    pub fn state(&self) -> IngestionState {
        self.inner.read().expect("status lock poisoned").state
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let inner = self.inner.read().expect("status lock poisoned");
        StatusSnapshot {
            enabled: inner.enabled,
            running: inner.state == IngestionState::Running,
            reason: inner.reason.clone(),
        }
    }

    /// Stay disabled, recording why.
    pub(crate) fn mark_disabled(&self, reason: impl Into<String>) {
        let mut inner = self.inner.write().expect("status lock poisoned");
        inner.state = IngestionState::Disabled;
        inner.reason = Some(reason.into());
    }

    pub(crate) fn mark_running(&self) {
        let mut inner = self.inner.write().expect("status lock poisoned");
        inner.state = IngestionState::Running;
        inner.reason = None;
    }
}
