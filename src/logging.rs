//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. explicit [`LogLevel`] (e.g. from a `--log-level` flag)
//! 2. `CWF_LOG` environment variable, in `EnvFilter` syntax (e.g. "debug",
//!    "cwf=trace")
//! 3. default to `info`
//!
//! Logs go to STDERR so that stdout stays free for results.

use anyhow::{Result, anyhow};
use clap::ValueEnum;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable consulted when no explicit level is given.
pub const LOG_ENV: &str = "CWF_LOG";

/// Verbosity accepted on the command line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings, such as panicking task bodies.
    Warn,
    /// Default.
    Info,
    /// Worker and execution lifecycle.
    Debug,
    /// Every task step.
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
/// If a global subscriber is already installed.
pub fn init_logging(level: Option<LogLevel>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::default().add_directive(tracing::Level::from(level).into()),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
}
