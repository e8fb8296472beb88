//! Logging setup shared by the command line tools.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the binaries.
//!
//! # Log Levels
//!
//! - `warn`: recovered failures (skipped rows, items without attachment)
//! - `info`: progress and summary counts
//! - `debug`: per-row and per-bundle detail
//! - `trace`: ignored CSV columns
//!
//! # Usage
//!
//! ```no_run
//! use dspace_migrate::logging::{LogConfig, init_logging};
//!
//! init_logging(&LogConfig::from_debug(false)).unwrap();
//! ```

use std::io::{self, IsTerminal};
use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

/// Configuration for log output.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level used when `RUST_LOG` is unset or ignored
    pub level: Level,
    /// Ignore `RUST_LOG` and log at `level` exactly
    pub force_level: bool,
    /// Include the module path of each event
    pub with_target: bool,
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            force_level: false,
            with_target: false,
            with_ansi: io::stdout().is_terminal(),
        }
    }
}

impl LogConfig {
    /// Create a `LogConfig` from the `--debug` flag.
    ///
    /// Debug logging overrides `RUST_LOG`; otherwise `RUST_LOG` may adjust the
    /// default `info` level.
    #[must_use]
    pub fn from_debug(debug: bool) -> Self {
        if debug {
            Self {
                level: Level::DEBUG,
                force_level: true,
                ..Default::default()
            }
        } else {
            Self::default()
        }
    }

    #[must_use]
    pub fn with_target(mut self, enable: bool) -> Self {
        self.with_target = enable;
        self
    }

    #[must_use]
    pub fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }
}

/// Install the global subscriber, writing to stdout.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), TryInitError> {
    init_logging_with_writer(config, io::stdout)
}

/// Install the global subscriber with a custom writer.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W) -> Result<(), TryInitError>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(config.with_ansi)
        .with_target(config.with_target)
        .without_time();

    tracing_subscriber::registry()
        .with(build_env_filter(config))
        .with(layer)
        .try_init()
}

fn build_env_filter(config: &LogConfig) -> EnvFilter {
    let level = config.level.as_str().to_lowercase();
    // Dependencies stay at warn to keep the output about the migration
    let default = || EnvFilter::new(format!("warn,dspace_migrate={level},rename_bundles={level}"));

    if config.force_level {
        return default();
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default())
}
