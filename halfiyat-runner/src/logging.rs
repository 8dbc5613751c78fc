//! Logging configuration and initialization.

use std::env;

use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line records (default; suits cron logs)
    #[default]
    Compact,
    /// Multi-line human-readable records
    Pretty,
}

impl LogFormat {
    /// Parse format from string; anything unrecognised is compact.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset.
    pub default_level: String,
    pub include_target: bool,
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            default_level: "info".to_string(),
            include_target: false,
            ansi: false,
        }
    }
}

impl LogConfig {
    /// Reads `LOG_FORMAT` (compact or pretty) and `LOG_LEVEL`.
    /// `RUST_LOG` still wins over `LOG_LEVEL` at init time.
    pub fn from_env() -> Self {
        Self {
            format: env::var("LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or_default(),
            default_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            ..Self::default()
        }
    }

    pub fn with_default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }
}

/// Install the global subscriber. Logs go to stderr with UTC timestamps.
///
/// # Errors
///
/// Fails if a global subscriber is already set.
pub fn init_logging(config: LogConfig) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.include_target)
        .with_ansi(config.ansi)
        .with_timer(ChronoUtc::new("%Y-%m-%dT%H:%M:%S%.3fZ".to_string()));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.format {
        LogFormat::Compact => registry.with(layer.compact()).try_init(),
        LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
    }
}
