//! Read-only HTTP status surface.
//!
//! `GET /` describes the service and ingestion state, `GET /api/v1/health`
//! is a liveness probe and `GET /api/v1/stats` exposes processing metrics.

use std::net::SocketAddr;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use warp::{Filter, Rejection, Reply};

use crate::metrics::ServiceMetrics;
use crate::status::{IngestionStatus, StatusSnapshot};

pub const SERVICE_NAME: &str = "ai-scoring";
pub const API_VERSION: &str = "v1";

/// Errors shown by `/api/v1/stats`.
pub const RECENT_ERRORS_IN_STATS: usize = 5;

#[derive(Debug, Serialize)]
struct ServiceInfo {
    service: &'static str,
    version: &'static str,
    ingestion: StatusSnapshot,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

/// All routes of the status surface.
pub fn routes(
    metrics: ServiceMetrics,
    status: IngestionStatus,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let root = warp::path::end()
        .and(warp::get())
        .and(warp::any().map(move || status.clone()))
        .map(|status: IngestionStatus| {
            warp::reply::json(&ServiceInfo {
                service: SERVICE_NAME,
                version: API_VERSION,
                ingestion: status.snapshot(),
            })
        });

    let health = warp::path!("api" / "v1" / "health")
        .and(warp::get())
        .map(|| warp::reply::json(&Health { status: "ok" }));

    let stats = warp::path!("api" / "v1" / "stats")
        .and(warp::get())
        .and(warp::any().map(move || metrics.clone()))
        .map(|metrics: ServiceMetrics| {
            warp::reply::json(&metrics.snapshot(RECENT_ERRORS_IN_STATS))
        });

    root.or(health).or(stats)
}

/// Bind `addr` and serve the routes on a separate task until `shutdown`
/// fires. Returns the bound address.
pub fn serve(
    addr: SocketAddr,
    metrics: ServiceMetrics,
    status: IngestionStatus,
    shutdown: CancellationToken,
) -> Result<(SocketAddr, JoinHandle<()>), warp::Error> {
    let (bound, server) = warp::serve(routes(metrics, status))
        .try_bind_with_graceful_shutdown(addr, async move { shutdown.cancelled().await })?;

    info!(addr = %bound, "http status server listening");
    Ok((bound, tokio::spawn(server)))
}
