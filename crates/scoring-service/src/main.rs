//! Scoring service: consumes wallet transaction histories from a broker,
//! scores each wallet's DEX activity and publishes the result to a success or
//! failure stream. A small HTTP surface reports health, ingestion state and
//! processing stats.

mod broker;
mod config;
mod errors;
mod http;
mod ingestion;
mod logging;
mod metrics;
mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use wallet_scoring::WalletScorer;

use crate::config::ServiceConfig;
use crate::ingestion::start_ingestion;
use crate::metrics::ServiceMetrics;
use crate::status::IngestionStatus;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignore if missing).
    let _ = dotenvy::dotenv();

    let config = ServiceConfig::from_env().context("failed to load service config")?;

    // Held until exit; dropping it flushes the file writer.
    let _log_guard = logging::init_tracing(config.log_dir.as_deref())?;

    info!(
        broker_enabled = config.broker.enabled,
        broker_url = %config.broker.url,
        input = %config.broker.input_channel,
        consumer_group = %config.broker.consumer_group,
        http = %config.http_bind_addr,
        "scoring service starting"
    );

    // -----------------------------------------------------------------------
    // Shared state
    // -----------------------------------------------------------------------

    let metrics = ServiceMetrics::new();
    let status = IngestionStatus::new(config.broker.enabled);
    let scorer = Arc::new(WalletScorer::placeholder());
    let shutdown = CancellationToken::new();

    // -----------------------------------------------------------------------
    // HTTP surface, then ingestion
    // -----------------------------------------------------------------------

    let (_, http_handle) = http::serve(
        config.http_bind_addr,
        metrics.clone(),
        status.clone(),
        shutdown.clone(),
    )
    .with_context(|| format!("failed to bind http server on {}", config.http_bind_addr))?;

    let provider = broker::select_provider(&config.broker);
    let ingestion = start_ingestion(
        provider.as_ref(),
        &config.broker,
        scorer,
        metrics.clone(),
        status.clone(),
    )
    .await;

    info!(ingestion = ?status.state(), "startup complete, press Ctrl+C to shutdown");

    // -----------------------------------------------------------------------
    // Wait for shutdown
    // -----------------------------------------------------------------------

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    info!("shutdown signal received, stopping gracefully...");
    shutdown.cancel();

    if let Some(handle) = ingestion {
        handle.stop().await;
    }
    if let Err(e) = http_handle.await {
        error!(error = %e, "http server task panicked");
    }

    info!(
        processed_wallets = metrics.processed_wallets(),
        avg_processing_ms = metrics.avg_processing_ms(),
        "scoring service stopped"
    );
    Ok(())
}
