//! Logging utilities for the MedRemind backend.
//!
//! Sets up the global `tracing` subscriber once at startup: a formatted stdout
//! layer, an `EnvFilter` (honouring `RUST_LOG`), and optionally a daily rolling
//! log file when `logging.directory` is configured.

use medremind_config::LoggingConfig;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name prefix used for rolling log files
pub const LOG_FILE_PREFIX: &str = "medremind.log";

/// Initialize the tracing subscriber with a specific log level.
pub fn init_with_level(level: Level) {
    let result = tracing_subscriber::registry()
        .with(stdout_layer())
        .with(build_filter(level))
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Initialize logging from the application's logging section.
///
/// Returns the file writer guard when file logging is enabled; the caller must
/// keep it alive for the lifetime of the process or buffered lines are lost.
pub fn init_from_config(config: Option<&LoggingConfig>) -> Option<WorkerGuard> {
    let level = config
        .and_then(|c| c.level.as_deref())
        .and_then(|l| l.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let directory = config.and_then(|c| c.directory.clone());
    let Some(directory) = directory else {
        init_with_level(level);
        return None;
    };

    let appender = tracing_appender::rolling::daily(&directory, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let result = tracing_subscriber::registry()
        .with(stdout_layer())
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(build_filter(level))
        .try_init();

    if result.is_ok() {
        info!(
            "Logging initialized at level: {} (files in {})",
            level, directory
        );
    }
    Some(guard)
}

fn stdout_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
}

fn build_filter(level: Level) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match format!("medremind={}", level).parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}
