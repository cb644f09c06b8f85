use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "scoring_service=info,wallet_scoring=info,warn";

/// Initialise the global tracing subscriber.
///
/// Always logs compactly to stderr. When `log_dir` is set, also writes JSON
/// lines to a daily-rolling file; the returned [`WorkerGuard`] **must** then
/// be held for the lifetime of the process, dropping it flushes and closes
/// the file writer.
pub fn init_tracing(log_dir: Option<&str>) -> Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory: {dir}"))?;
            let file_appender = tracing_appender::rolling::daily(dir, "scoring-service.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .json()
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .init();

    Ok(guard)
}
