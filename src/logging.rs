//! Tracing setup. The terminal belongs to the table view, so events go to a log file.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::GridError;

pub const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber. `RUST_LOG` takes precedence over `default_filter`.
pub fn init(log_file: &Path, default_filter: &str) -> Result<(), GridError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| GridError::LoggingFailed(e.to_string()))
}
