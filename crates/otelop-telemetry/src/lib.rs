//! Structured logging for the otelop operator.
//!
//! The operator logs through the [`tracing`] macros. This crate installs the
//! global subscriber those events are written to.
//!
//! # Example
//!
//! ```rust,no_run
//! use otelop_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production()).expect("logging already initialized");
//!
//! tracing::info!(platform = "OpenShift", "platform detected");
//! ```
//!
//! Event field names shared across the operator are defined in
//! [`logging::fields`]:
//!
//! ```rust
//! use otelop_telemetry::logging::fields;
//!
//! tracing::info!({ fields::PLATFORM } = "OpenShift", "platform detected");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
