//! Consume, score, produce.
//!
//! A poller task reads batches from the input channel and hands them over a
//! bounded channel to the ingestion loop, which scores every message in turn
//! and publishes a success or failure payload for each. A failing message
//! never stops the batch or the loop; the failure channel is the only
//! recovery path.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wallet_scoring::types::PartialWalletMessage;
use wallet_scoring::{ScoreFunction, WalletScorer};

use crate::broker::{ChannelProvider, Connection, MessageConsumer, MessagePublisher, RawMessage};
use crate::config::BrokerConfig;
use crate::errors::IngestError;
use crate::metrics::ServiceMetrics;
use crate::status::IngestionStatus;

/// Log throughput every this many handled messages.
const STATS_LOG_INTERVAL: u64 = 1_000;

/// Batches buffered between the poller and the loop.
const BATCH_CHANNEL_CAPACITY: usize = 1;

/// Destination streams for results.
#[derive(Debug, Clone)]
pub struct OutputChannels {
    pub success: String,
    pub failure: String,
}

/// Result of handling one raw message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Scored,
    Failed,
}

/// Owns the running ingestion tasks.
pub struct IngestionHandle {
    shutdown: CancellationToken,
    poller: JoinHandle<()>,
    worker: JoinHandle<()>,
}

impl IngestionHandle {
    /// Stop polling and processing. Batches already polled but not yet
    /// handled are dropped.
    pub async fn stop(self) {
        self.shutdown.cancel();
        let (poller, worker) = tokio::join!(self.poller, self.worker);
        if let Err(e) = poller {
            error!(error = %e, "poller task panicked");
        }
        if let Err(e) = worker {
            error!(error = %e, "ingestion loop task panicked");
        }
    }
}

/// Connect the selected provider and, if it is ready, spawn ingestion.
///
/// Returns immediately after spawning. A disabled provider or a failed
/// connection leaves ingestion disabled with the reason recorded in `status`;
/// the rest of the service is unaffected.
pub async fn start_ingestion<S>(
    provider: &dyn ChannelProvider,
    config: &BrokerConfig,
    scorer: Arc<WalletScorer<S>>,
    metrics: ServiceMetrics,
    status: IngestionStatus,
) -> Option<IngestionHandle>
where
    S: ScoreFunction + 'static,
{
    let channels = match provider.connect().await {
        Ok(Connection::Ready(channels)) => channels,
        Ok(Connection::Disabled { reason }) => {
            info!(provider = provider.name(), reason = %reason, "ingestion disabled");
            status.mark_disabled(reason);
            return None;
        }
        Err(e) => {
            let reason = format!("{}: {}", e.kind(), e);
            error!(provider = provider.name(), error = %reason, "ingestion failed to start");
            status.mark_disabled(reason);
            return None;
        }
    };

    status.mark_running();
    info!(
        provider = provider.name(),
        input = %config.input_channel,
        success = %config.success_channel,
        failure = %config.failure_channel,
        batch_size = config.batch_size,
        poll_timeout_ms = config.poll_timeout_ms,
        "ingestion running"
    );

    let shutdown = CancellationToken::new();
    let (batch_tx, batch_rx) = mpsc::channel::<Vec<RawMessage>>(BATCH_CHANNEL_CAPACITY);

    let poller = tokio::spawn(run_poller(
        channels.consumer,
        config.poll_timeout(),
        batch_tx,
        shutdown.clone(),
    ));

    let outputs = OutputChannels {
        success: config.success_channel.clone(),
        failure: config.failure_channel.clone(),
    };
    let worker = tokio::spawn(run_ingestion_loop(
        batch_rx,
        channels.publisher,
        outputs,
        scorer,
        metrics,
        shutdown.clone(),
    ));

    Some(IngestionHandle {
        shutdown,
        poller,
        worker,
    })
}

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------

/// Poll the input channel and forward non-empty batches.
async fn run_poller(
    mut consumer: Box<dyn MessageConsumer>,
    poll_timeout: Duration,
    batch_tx: mpsc::Sender<Vec<RawMessage>>,
    shutdown: CancellationToken,
) {
    loop {
        let polled = tokio::select! {
            polled = consumer.poll(poll_timeout) => polled,
            _ = shutdown.cancelled() => {
                debug!("poller shutting down");
                return;
            }
        };

        match polled {
            Ok(batch) if batch.is_empty() => {}
            Ok(batch) => {
                debug!(size = batch.len(), "polled batch");
                if batch_tx.send(batch).await.is_err() {
                    debug!("batch channel closed, stopping poller");
                    return;
                }
            }
            Err(e) => {
                // No backoff: wait one poll period and try again.
                warn!(error = %e, "poll failed");
                tokio::select! {
                    _ = tokio::time::sleep(poll_timeout) => {}
                    _ = shutdown.cancelled() => return,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Handle batches sequentially until shutdown or until the poller is gone.
async fn run_ingestion_loop<S: ScoreFunction>(
    mut batch_rx: mpsc::Receiver<Vec<RawMessage>>,
    publisher: Arc<dyn MessagePublisher>,
    outputs: OutputChannels,
    scorer: Arc<WalletScorer<S>>,
    metrics: ServiceMetrics,
    shutdown: CancellationToken,
) {
    let mut scored = 0u64;
    let mut failed = 0u64;

    loop {
        let batch = tokio::select! {
            batch = batch_rx.recv() => match batch {
                Some(batch) => batch,
                None => {
                    info!("batch channel closed, stopping ingestion loop");
                    return;
                }
            },
            _ = shutdown.cancelled() => {
                info!(scored, failed, "ingestion loop shutting down");
                return;
            }
        };

        for message in &batch {
            match handle_message(message, publisher.as_ref(), &outputs, &scorer, &metrics).await {
                Outcome::Scored => scored += 1,
                Outcome::Failed => failed += 1,
            }

            if (scored + failed) % STATS_LOG_INTERVAL == 0 {
                info!(
                    scored,
                    failed,
                    avg_processing_ms = metrics.avg_processing_ms(),
                    "ingestion stats"
                );
            }
        }

        // Let other tasks on the runtime run between batches.
        tokio::task::yield_now().await;
    }
}

/// Score one raw message and publish its result.
///
/// Never fails: errors become a failure payload plus an entry in the metrics
/// error log.
pub async fn handle_message<S: ScoreFunction>(
    message: &RawMessage,
    publisher: &dyn MessagePublisher,
    outputs: &OutputChannels,
    scorer: &WalletScorer<S>,
    metrics: &ServiceMetrics,
) -> Outcome {
    let started = Instant::now();

    match score_and_publish(message, publisher, &outputs.success, scorer, started).await {
        Ok(elapsed) => {
            metrics.record_success(elapsed);
            Outcome::Scored
        }
        Err(err) => {
            publish_failure(message, &err, publisher, &outputs.failure, metrics, started).await;
            Outcome::Failed
        }
    }
}

async fn score_and_publish<S: ScoreFunction>(
    message: &RawMessage,
    publisher: &dyn MessagePublisher,
    channel: &str,
    scorer: &WalletScorer<S>,
    started: Instant,
) -> Result<Duration, IngestError> {
    let mut success = scorer.score_payload(&message.payload)?;
    let elapsed = started.elapsed();
    success.processing_time_ms = elapsed.as_millis() as u64;

    let body = serde_json::to_string(&success)?;
    publisher.publish(channel, &body).await?;
    Ok(elapsed)
}

async fn publish_failure(
    message: &RawMessage,
    err: &IngestError,
    publisher: &dyn MessagePublisher,
    channel: &str,
    metrics: &ServiceMetrics,
    started: Instant,
) {
    metrics.record_error(err.to_string());

    let failure = PartialWalletMessage::from_raw(&message.payload).into_failure(
        err.describe(),
        chrono::Utc::now().timestamp(),
        started.elapsed().as_millis() as u64,
    );

    warn!(
        id = %message.id,
        wallet = %failure.wallet_address,
        kind = err.kind(),
        error = %err,
        "wallet message failed"
    );

    let body = match serde_json::to_string(&failure) {
        Ok(body) => body,
        Err(e) => {
            error!(id = %message.id, error = %e, "failed to encode failure payload");
            metrics.record_error(format!("failed to encode failure payload: {e}"));
            return;
        }
    };

    if let Err(e) = publisher.publish(channel, &body).await {
        error!(id = %message.id, channel, error = %e, "failed to publish failure payload");
        metrics.record_error(format!("failed to publish failure payload: {e}"));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
