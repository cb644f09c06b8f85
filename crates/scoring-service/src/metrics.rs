//! Processing counters and a bounded log of recent errors.
//!
//! Shared between the ingestion loop (writer) and the HTTP status routes
//! (readers). Cloning a [`ServiceMetrics`] yields another handle to the same
//! state.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

/// Capacity of the recent-error log.
pub const MAX_RECENT_ERRORS: usize = 50;

#[derive(Debug, Default)]
struct MetricsState {
    processed_wallets: u64,
    total_processing_ms: f64,
    avg_processing_ms: f64,
    last_errors: VecDeque<String>,
}

/// Point-in-time copy of the metrics for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub processed_wallets: u64,
    pub avg_processing_ms: f64,
    /// Most recent errors, oldest first.
    pub last_errors: Vec<String>,
}

/// Thread-safe handle to the process-wide processing metrics.
#[derive(Debug, Clone, Default)]
pub struct ServiceMetrics {
    state: Arc<Mutex<MetricsState>>,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one scored wallet and fold its duration into the average.
    pub fn record_success(&self, elapsed: Duration) {
        let mut state = self.state.lock().expect("metrics lock poisoned");
        state.processed_wallets += 1;
        state.total_processing_ms += elapsed.as_secs_f64() * 1_000.0;
        state.avg_processing_ms = state.total_processing_ms / state.processed_wallets as f64;
    }

    /// Append an error, evicting the oldest one beyond [`MAX_RECENT_ERRORS`].
    pub fn record_error(&self, message: impl Into<String>) {
        let mut state = self.state.lock().expect("metrics lock poisoned");
        state.last_errors.push_back(message.into());
        while state.last_errors.len() > MAX_RECENT_ERRORS {
            state.last_errors.pop_front();
        }
    }

    pub fn processed_wallets(&self) -> u64 {
        self.state.lock().expect("metrics lock poisoned").processed_wallets
    }

    pub fn avg_processing_ms(&self) -> f64 {
        self.state.lock().expect("metrics lock poisoned").avg_processing_ms
    }

    /// The `n` most recent errors, oldest first.
    pub fn recent_errors(&self, n: usize) -> Vec<String> {
        let state = self.state.lock().expect("metrics lock poisoned");
        let skip = state.last_errors.len().saturating_sub(n);
        state.last_errors.iter().skip(skip).cloned().collect()
    }

    /// Snapshot with the `recent` most recent errors.
    pub fn snapshot(&self, recent: usize) -> MetricsSnapshot {
        let state = self.state.lock().expect("metrics lock poisoned");
        let skip = state.last_errors.len().saturating_sub(recent);
        MetricsSnapshot {
            processed_wallets: state.processed_wallets,
            avg_processing_ms: state.avg_processing_ms,
            last_errors: state.last_errors.iter().skip(skip).cloned().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_metrics() {
        let metrics = ServiceMetrics::new();
        assert_eq!(metrics.processed_wallets(), 0);
        assert_eq!(metrics.avg_processing_ms(), 0.0);
        assert!(metrics.recent_errors(5).is_empty());
    }

    #[test]
    fn test_running_average() {
        let metrics = ServiceMetrics::new();
        metrics.record_success(Duration::from_millis(10));
        metrics.record_success(Duration::from_millis(20));
        metrics.record_success(Duration::from_millis(30));
        assert_eq!(metrics.processed_wallets(), 3);
        assert!((metrics.avg_processing_ms() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_errors_do_not_count_as_processed() {
        let metrics = ServiceMetrics::new();
        metrics.record_error("boom");
        assert_eq!(metrics.processed_wallets(), 0);
        assert_eq!(metrics.recent_errors(5), vec!["boom".to_string()]);
    }

    #[test]
    fn test_error_log_evicts_oldest() {
        let metrics = ServiceMetrics::new();
        for i in 0..(MAX_RECENT_ERRORS + 7) {
            metrics.record_error(format!("error {i}"));
        }
        let all = metrics.recent_errors(usize::MAX);
        assert_eq!(all.len(), MAX_RECENT_ERRORS);
        assert_eq!(all.first().unwrap(), "error 7");
        assert_eq!(all.last().unwrap(), &format!("error {}", MAX_RECENT_ERRORS + 6));
    }

    #[test]
    fn test_snapshot_keeps_most_recent() {
        let metrics = ServiceMetrics::new();
        for i in 0..8 {
            metrics.record_error(format!("e{i}"));
        }
        metrics.record_success(Duration::from_millis(4));
        let snap = metrics.snapshot(5);
        assert_eq!(snap.processed_wallets, 1);
        assert_eq!(snap.last_errors, vec!["e3", "e4", "e5", "e6", "e7"]);
    }

    #[test]
    fn test_clones_share_state() {
        let metrics = ServiceMetrics::new();
        let reader = metrics.clone();
        metrics.record_success(Duration::from_millis(1));
        assert_eq!(reader.processed_wallets(), 1);
    }
}
