//! Configuration for the scoring service binary.
//!
//! Loads from environment variables with defaults. Optionally loads a JSON
//! config file if `SCORING_CONFIG_PATH` is set; environment variables take
//! precedence over the file.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Env var that turns the broker integration on.
pub const ENABLE_BROKER_VAR: &str = "ENABLE_BROKER";

/// Broker connection and channel settings.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Whether ingestion should start at all.
    pub enabled: bool,
    /// Redis connection URL.
    pub url: String,
    /// Stream holding inbound wallet messages.
    pub input_channel: String,
    /// Stream receiving success payloads.
    pub success_channel: String,
    /// Stream receiving failure payloads.
    pub failure_channel: String,
    /// Consumer group reading the input stream.
    pub consumer_group: String,
    /// Consumer name within the group.
    pub consumer_name: String,
    /// Upper bound on a single poll (milliseconds).
    pub poll_timeout_ms: u64,
    /// Maximum messages returned by one poll.
    pub batch_size: usize,
}

impl BrokerConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

/// Runtime configuration for the scoring service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub broker: BrokerConfig,
    /// Address the HTTP status surface binds to.
    pub http_bind_addr: SocketAddr,
    /// Directory for JSON log files. Stderr only when unset.
    pub log_dir: Option<String>,
}

/// Optional JSON config overlay.
#[derive(Debug, Default, Deserialize)]
struct JsonConfig {
    enabled: Option<bool>,
    broker_url: Option<String>,
    input_channel: Option<String>,
    success_channel: Option<String>,
    failure_channel: Option<String>,
    consumer_group: Option<String>,
    consumer_name: Option<String>,
    poll_timeout_ms: Option<u64>,
    batch_size: Option<usize>,
    http_bind_addr: Option<String>,
    log_dir: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let json_cfg = match var("SCORING_CONFIG_PATH") {
            Some(path) => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file: {path}"))?;
                serde_json::from_str::<JsonConfig>(&contents)
                    .with_context(|| format!("failed to parse config file: {path}"))?
            }
            None => JsonConfig::default(),
        };

        let text = |key: &str, overlay: &Option<String>, default: &str| -> String {
            var(key)
                .or_else(|| overlay.clone())
                .unwrap_or_else(|| default.to_string())
        };

        // Only an explicit "true" enables the broker.
        let enabled = var(ENABLE_BROKER_VAR)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .or(json_cfg.enabled)
            .unwrap_or(false);

        let poll_timeout_ms = var("BROKER_POLL_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .or(json_cfg.poll_timeout_ms)
            .unwrap_or(1_000);

        let batch_size = var("BROKER_BATCH_SIZE")
            .and_then(|v| v.parse().ok())
            .filter(|n: &usize| *n > 0)
            .or(json_cfg.batch_size.filter(|n| *n > 0))
            .unwrap_or(100);

        let broker = BrokerConfig {
            enabled,
            url: text("BROKER_URL", &json_cfg.broker_url, "redis://localhost:6379"),
            input_channel: text(
                "BROKER_INPUT_CHANNEL",
                &json_cfg.input_channel,
                "wallet-transactions",
            ),
            success_channel: text(
                "BROKER_SUCCESS_CHANNEL",
                &json_cfg.success_channel,
                "wallet-scores-success",
            ),
            failure_channel: text(
                "BROKER_FAILURE_CHANNEL",
                &json_cfg.failure_channel,
                "wallet-scores-failure",
            ),
            consumer_group: text(
                "BROKER_CONSUMER_GROUP",
                &json_cfg.consumer_group,
                "ai-scoring-service",
            ),
            consumer_name: text(
                "BROKER_CONSUMER_NAME",
                &json_cfg.consumer_name,
                "scoring-service-1",
            ),
            poll_timeout_ms,
            batch_size,
        };

        let bind = text("HTTP_BIND_ADDR", &json_cfg.http_bind_addr, "0.0.0.0:8000");
        let http_bind_addr = bind
            .parse()
            .with_context(|| format!("invalid HTTP bind address: {bind}"))?;

        let log_dir = var("LOG_DIR").or(json_cfg.log_dir);

        Ok(Self {
            broker,
            http_bind_addr,
            log_dir,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
