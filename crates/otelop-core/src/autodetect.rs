//! Platform auto-detection capability.
//!
//! The [`AutoDetect`] trait is the seam between the configuration layer and
//! whatever actually inspects the environment. Implementations live in
//! adapters (API discovery clients, probes, test doubles).

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::Platform;

/// Boxed error type used for errors raised by injected collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors a detector can report.
#[derive(Debug, Error)]
pub enum AutoDetectError {
    /// The detector could not reach the source it inspects.
    #[error("platform detector unavailable: {reason}")]
    Unavailable {
        /// Why the detector could not answer.
        reason: String,
    },

    /// The detector failed while determining the platform.
    #[error("platform detection failed: {source}")]
    Failed {
        /// Underlying error.
        #[source]
        source: BoxError,
    },
}

impl AutoDetectError {
    /// Create a new unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Create a new failed error from any error type.
    pub fn failed(source: impl Into<BoxError>) -> Self {
        Self::Failed {
            source: source.into(),
        }
    }
}

/// Capability that determines the platform the operator runs on.
///
/// A detector may answer [`Platform::Unknown`] when it cannot give a
/// definitive answer yet; the caller is expected to ask again later.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use otelop_core::{AutoDetect, AutoDetectError, Platform};
///
/// struct AlwaysOpenShift;
///
/// #[async_trait]
/// impl AutoDetect for AlwaysOpenShift {
///     async fn platform(&self) -> Result<Platform, AutoDetectError> {
///         Ok(Platform::OpenShift)
///     }
/// }
/// ```
#[async_trait]
pub trait AutoDetect: Send + Sync {
    /// Determine the current platform.
    async fn platform(&self) -> Result<Platform, AutoDetectError>;
}

/// A detector backed by a synchronous closure.
///
/// # Example
///
/// ```
/// use otelop_core::{FnAutoDetect, Platform};
///
/// let detector = FnAutoDetect::new(|| Ok(Platform::Kubernetes));
/// ```
pub struct FnAutoDetect<F>
where
    F: Fn() -> Result<Platform, AutoDetectError> + Send + Sync,
{
    func: F,
}

impl<F> FnAutoDetect<F>
where
    F: Fn() -> Result<Platform, AutoDetectError> + Send + Sync,
{
    /// Wraps the closure.
    #[must_use]
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> fmt::Debug for FnAutoDetect<F>
where
    F: Fn() -> Result<Platform, AutoDetectError> + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAutoDetect").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> AutoDetect for FnAutoDetect<F>
where
    F: Fn() -> Result<Platform, AutoDetectError> + Send + Sync,
{
    async fn platform(&self) -> Result<Platform, AutoDetectError> {
        (self.func)()
    }
}

/// A detector that always answers the same platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticAutoDetect(pub Platform);

#[async_trait]
impl AutoDetect for StaticAutoDetect {
    async fn platform(&self) -> Result<Platform, AutoDetectError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_static_detector() {
        let detector = StaticAutoDetect(Platform::OpenShift);
        assert_eq!(detector.platform().await.unwrap(), Platform::OpenShift);
    }

    #[tokio::test]
    async fn test_fn_detector_is_called_each_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let detector = FnAutoDetect::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Platform::Unknown)
        });

        detector.platform().await.unwrap();
        detector.platform().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fn_detector_error() {
        let detector = FnAutoDetect::new(|| Err(AutoDetectError::unavailable("api server down")));
        let err = detector.platform().await.unwrap_err();
        assert!(err.to_string().contains("api server down"));
    }

    #[tokio::test]
    async fn test_detector_as_trait_object() {
        let detector: Arc<dyn AutoDetect> = Arc::new(StaticAutoDetect(Platform::Kubernetes));
        assert_eq!(detector.platform().await.unwrap(), Platform::Kubernetes);
    }

    #[test]
    fn test_failed_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "discovery timed out");
        let err = AutoDetectError::failed(io);
        assert!(err.to_string().contains("discovery timed out"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
