//! Deployment platform identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The platform the operator is deployed on.
///
/// [`Platform::Unknown`] is the sentinel used until a detector gives a
/// definitive answer.
///
/// # Example
///
/// ```
/// use otelop_core::Platform;
///
/// let platform: Platform = "openshift".parse().unwrap();
/// assert_eq!(platform, Platform::OpenShift);
/// assert!(platform.is_known());
/// assert_eq!(platform.to_string(), "OpenShift");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// The platform has not been resolved yet.
    #[default]
    Unknown,
    /// A generic Kubernetes cluster.
    Kubernetes,
    /// An OpenShift cluster.
    OpenShift,
}

impl Platform {
    /// All platform values, sentinel first.
    pub const ALL: [Self; 3] = [Self::Unknown, Self::Kubernetes, Self::OpenShift];

    /// Returns `true` unless this is [`Platform::Unknown`].
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Returns the display name of the platform.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Kubernetes => "Kubernetes",
            Self::OpenShift => "OpenShift",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown platform name: {0:?}")]
pub struct ParsePlatformError(String);

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknown" => Ok(Self::Unknown),
            "kubernetes" | "k8s" => Ok(Self::Kubernetes),
            "openshift" => Ok(Self::OpenShift),
            _ => Err(ParsePlatformError(s.to_string())),
        }
    }
}
