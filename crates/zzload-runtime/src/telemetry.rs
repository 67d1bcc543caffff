//! Logging setup
//!
//! Library code only emits `tracing` events. Binaries, test harnesses and
//! demos call `init_logging` once to get them printed.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::filter::{EnvFilter, ParseError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogConfig {
    /// Directives used when `RUST_LOG` is unset
    pub filter: String,
    /// One JSON object per line instead of the human format
    pub json: bool,
    pub with_target: bool,
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: "zzload=info".into(),
            json: false,
            with_target: true,
            ansi: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] ParseError),

    #[error("failed to install subscriber: {0}")]
    Install(String),
}

/// Install a global fmt subscriber writing to stderr. `RUST_LOG` wins over
/// `config.filter`. Fails if a subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.filter))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| TelemetryError::Install(e.to_string()))
}
