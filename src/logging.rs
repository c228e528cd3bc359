//! Log setup. The TUI owns the terminal, so events go to a file in the
//! data directory rather than stderr.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::model::LogConfig;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("could not open log file {path}: {source}")]
    OpenError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// `RUST_LOG` when set and valid, else the configured level, else `info`
pub fn env_filter(configured: &str) -> EnvFilter {
    std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .or_else(|| EnvFilter::try_new(configured).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

pub fn log_path(data_dir: &Path, config: &LogConfig) -> PathBuf {
    data_dir.join(&config.file)
}

fn layer<W>(writer: W) -> fmt::Layer<tracing_subscriber::Registry, fmt::format::DefaultFields, fmt::format::Format, W>
where
    W: for<'w> MakeWriter<'w> + 'static,
{
    fmt::layer().with_writer(writer).with_ansi(false).with_target(false)
}

/// Install the global subscriber, appending to the configured log file.
/// A second call is a no-op.
pub fn init(data_dir: &Path, config: &LogConfig) -> Result<(), LogError> {
    let path = log_path(data_dir, config);
    let file: File = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LogError::OpenError {
            path: path.clone(),
            source,
        })?;

    let installed = tracing_subscriber::registry()
        .with(layer(Mutex::new(file)))
        .with(env_filter(&config.level))
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(path = %path.display(), "logging started");
    }
    Ok(())
}
