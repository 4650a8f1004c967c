//! Structured logging setup.
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and one
//! formatting layer chosen by [`LogFormat`]. Field names shared by the
//! operator's events live in [`fields`].
//!
//! # Example
//!
//! ```rust,ignore
//! use otelop_telemetry::logging::{fields, init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development().with_env_override("OTELOP_LOG"))?;
//!
//! tracing::debug!({ fields::FREQUENCY_MS } = 5000, "starting platform auto-detection");
//! ```

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Default filter directive: the operator crates at `info`, everything else at `warn`.
pub const DEFAULT_DIRECTIVE: &str = "warn,otelop_config=info,otelop_core=info";

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line, human-readable output.
    Pretty,
    /// Single-line, human-readable output.
    Compact,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        })
    }
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" | "text" => Ok(Self::Compact),
            other => Err(TelemetryError::LoggingInit(format!(
                "unknown log format '{other}'"
            ))),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g., "info", "otelop_config=debug").
    pub directive: String,

    /// Output format.
    pub format: LogFormat,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directive: DEFAULT_DIRECTIVE.to_string(),
            format: LogFormat::Json,
            file_line_info: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Human-readable output with detection attempts visible.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            directive: "info,otelop_config=debug,otelop_core=debug".to_string(),
            format: LogFormat::Pretty,
            file_line_info: true,
            include_target: true,
        }
    }

    /// JSON output at the default directive.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Replace the directive with the value of `var`, when it is set and non-empty.
    #[must_use]
    pub fn with_env_override(self, var: &str) -> Self {
        self.with_directive_override(std::env::var(var).ok())
    }

    fn with_directive_override(mut self, directive: Option<String>) -> Self {
        if let Some(directive) = directive.filter(|d| !d.trim().is_empty()) {
            self.directive = directive;
        }
        self
    }
}

/// Initializes the global logging subscriber.
///
/// Does nothing when `config.enabled` is `false`.
///
/// # Errors
///
/// Returns `TelemetryError::LoggingInit` if the filter directive is invalid or
/// a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.directive)?;

    tracing_subscriber::registry()
        .with(fmt_layer(config).with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

fn fmt_layer(config: &LogConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = tracing_subscriber::fmt::layer()
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_target(config.include_target);

    match config.format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns error if the filter string is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::LoggingInit(format!("Invalid log directive: {e}")))
}

/// Field names used by the operator's structured events.
pub mod fields {
    /// Platform after a transition, or the platform being reported.
    pub const PLATFORM: &str = "platform";

    /// Platform before a transition.
    pub const PREVIOUS_PLATFORM: &str = "previous";

    /// Polling interval of the detection loop in milliseconds.
    pub const FREQUENCY_MS: &str = "frequency_ms";

    /// Policy of the detection loop.
    pub const POLICY: &str = "policy";

    /// Sequence number of a detection attempt.
    pub const ATTEMPT: &str = "attempt";

    /// Registration index of a change callback.
    pub const CALLBACK_INDEX: &str = "callback_index";

    /// Error message.
    pub const ERROR: &str = "error";
}
