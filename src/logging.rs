use std::{io, path::Path};

use thiserror::Error;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("could not create log directory: {0}")]
    Directory(#[from] io::Error),

    #[error("could not install the global subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Console output plus a daily-rolling `app.log` in `log_dir`.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init_logging<P: AsRef<Path>>(log_dir: P) -> Result<WorkerGuard, LoggingError> {
    let (subscriber, guard) = build_subscriber(log_dir.as_ref())?;
    subscriber.try_init()?;
    Ok(guard)
}

fn build_subscriber(
    log_dir: &Path,
) -> io::Result<(impl Subscriber + Send + Sync + 'static, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)?;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::daily(log_dir, "app.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer().with_writer(std::io::stdout);
    let file_layer = fmt::layer().with_writer(file_writer).with_ansi(false);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer);

    Ok((subscriber, guard))
}
