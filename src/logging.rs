//! Tracing subscriber setup

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter applied when `RUST_LOG` is unset or invalid
pub const DEFAULT_LOG_FILTER: &str = "tagwatch=info";

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Emit one JSON object per event instead of human-readable lines
    pub json: bool,
    /// Append to this file instead of writing to stderr
    pub file: Option<PathBuf>,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber
///
/// Events are written through a background worker; the returned guard must
/// be kept alive until exit or buffered events are lost.
pub fn init(options: &LogOptions) -> anyhow::Result<WorkerGuard> {
    let (writer, guard) = match &options.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let registry = tracing_subscriber::registry().with(env_filter());
    if options.json {
        registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(options.file.is_none()),
            )
            .try_init()?;
    }
    Ok(guard)
}
