//! Build-time version information.

use std::fmt;

use serde::{Deserialize, Serialize};

const FALLBACK_COLLECTOR_VERSION: &str = "0.0.0";
const FALLBACK_UNKNOWN: &str = "unknown";

/// Versions of the operator and of the components it manages.
///
/// Values are injected at build time through environment variables:
///
/// | Field | Source | Fallback |
/// |-------|--------|----------|
/// | `operator` | `CARGO_PKG_VERSION` | - |
/// | `build_date` | `OTELOP_BUILD_DATE` | `unknown` |
/// | `collector` | `OTELOP_COLLECTOR_VERSION` | `0.0.0` |
/// | `rustc` | `OTELOP_RUSTC_VERSION` | `unknown` |
///
/// # Example
///
/// ```
/// use otelop_core::Version;
///
/// let version = Version {
///     collector: "0.40.0".to_string(),
///     ..Version::current()
/// };
/// assert!(version.to_string().contains("OpenTelemetryCollector='0.40.0'"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Version of the operator itself.
    pub operator: String,
    /// Date the operator was built.
    pub build_date: String,
    /// Version of the OpenTelemetry Collector the operator deploys by default.
    pub collector: String,
    /// Compiler version used for the build.
    pub rustc: String,
}

impl Version {
    /// Returns the version information baked into this build.
    #[must_use]
    pub fn current() -> Self {
        Self {
            operator: env!("CARGO_PKG_VERSION").to_string(),
            build_date: option_env!("OTELOP_BUILD_DATE")
                .unwrap_or(FALLBACK_UNKNOWN)
                .to_string(),
            collector: non_empty_or(
                option_env!("OTELOP_COLLECTOR_VERSION"),
                FALLBACK_COLLECTOR_VERSION,
            ),
            rustc: option_env!("OTELOP_RUSTC_VERSION")
                .unwrap_or(FALLBACK_UNKNOWN)
                .to_string(),
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Version(Operator='{}', BuildDate='{}', OpenTelemetryCollector='{}', Rustc='{}')",
            self.operator, self.build_date, self.collector, self.rustc
        )
    }
}

fn non_empty_or(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}
