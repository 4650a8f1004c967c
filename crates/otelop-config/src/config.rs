//! The shared operator configuration.
//!
//! [`Configuration`] owns every resolved field. All fields except the platform
//! are fixed at construction; the platform is resolved through the configured
//! detector and changes only when the detector reports a different value.
//!
//! # Thread Safety
//!
//! The configuration is `Send + Sync` and meant to be shared as
//! `Arc<Configuration>`. The platform sits behind a reentrant lock that is held
//! across "store new value plus run callbacks", so a manual
//! [`auto_detect`](Configuration::auto_detect) and the background loop never
//! interleave their updates. The detector itself is awaited with no lock held.
//!
//! Callbacks run on the updating thread and read the new platform. Other
//! threads calling [`platform`](Configuration::platform) wait until dispatch
//! has finished, so they never see a value whose callbacks are still running.
//! A callback must therefore not block on another thread that reads the
//! platform.
//!
//! Every attempt takes a sequence number before the detector is queried. An
//! answer from an attempt older than the last applied one is discarded.

use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use otelop_core::{AutoDetect, Platform, Version};
use otelop_telemetry::logging::fields;
use parking_lot::ReentrantMutex;
use tracing::field::display;
use tracing::{debug, info, trace, warn};

use crate::detect::{self, AutoDetectHandle, AutoDetectPolicy};
use crate::error::{ConfigError, ConfigResult};
use crate::options::{ChangeCallback, ConfigOption, ConfigurationBuilder};

/// Image repository used when no collector image is configured.
pub const DEFAULT_COLLECTOR_IMAGE_BASE: &str = "quay.io/opentelemetry/opentelemetry-collector";

/// Config map entry used when none is configured.
pub const DEFAULT_COLLECTOR_CONFIG_MAP_ENTRY: &str = "collector.yaml";

/// Polling interval used when none is configured.
pub const DEFAULT_AUTO_DETECT_FREQUENCY: Duration = Duration::from_secs(5);

/// Operator configuration with an auto-detected platform.
///
/// # Example
///
/// ```
/// use otelop_config::{options, Configuration};
/// use otelop_core::{Platform, StaticAutoDetect};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), otelop_config::ConfigError> {
/// let config = Configuration::new([
///     options::auto_detect(StaticAutoDetect(Platform::OpenShift)),
///     options::on_change(|| {
///         println!("platform changed");
///         Ok(())
///     }),
/// ]);
///
/// assert_eq!(config.platform(), Platform::Unknown);
/// config.auto_detect().await?;
/// assert_eq!(config.platform(), Platform::OpenShift);
/// # Ok(())
/// # }
/// ```
pub struct Configuration {
    collector_image: String,
    collector_config_map_entry: String,
    version: Version,
    auto_detect: Option<Arc<dyn AutoDetect>>,
    auto_detect_frequency: Duration,
    auto_detect_policy: AutoDetectPolicy,
    on_change: Vec<ChangeCallback>,
    state: ReentrantMutex<PlatformState>,
    attempts: AtomicU64,
}

struct PlatformState {
    platform: Cell<Platform>,
    applied_attempt: Cell<u64>,
}

impl Configuration {
    /// Build a configuration by applying the options in order.
    pub fn new<I>(options: I) -> Self
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        ConfigurationBuilder::new().apply_all(options).build()
    }

    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }

    pub(crate) fn from_parts(builder: ConfigurationBuilder, collector_image: String) -> Self {
        Self {
            collector_image,
            collector_config_map_entry: builder.collector_config_map_entry,
            version: builder.version,
            auto_detect: builder.auto_detect,
            auto_detect_frequency: builder.auto_detect_frequency,
            auto_detect_policy: builder.auto_detect_policy,
            on_change: builder.on_change,
            state: ReentrantMutex::new(PlatformState {
                platform: Cell::new(builder.platform),
                applied_attempt: Cell::new(0),
            }),
            attempts: AtomicU64::new(0),
        }
    }

    /// The collector image to deploy.
    pub fn collector_image(&self) -> &str {
        &self.collector_image
    }

    /// The config map entry holding the collector configuration.
    pub fn collector_config_map_entry(&self) -> &str {
        &self.collector_config_map_entry
    }

    /// The current platform.
    ///
    /// Blocks while another thread is dispatching change callbacks.
    pub fn platform(&self) -> Platform {
        self.state.lock().platform.get()
    }

    /// The version the configuration was built with.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Polling interval of continuous detection.
    pub fn auto_detect_frequency(&self) -> Duration {
        self.auto_detect_frequency
    }

    /// When continuous detection stops.
    pub fn auto_detect_policy(&self) -> AutoDetectPolicy {
        self.auto_detect_policy
    }

    /// Whether a detector is configured.
    pub fn has_auto_detect(&self) -> bool {
        self.auto_detect.is_some()
    }

    /// Number of registered change callbacks.
    pub fn on_change_count(&self) -> usize {
        self.on_change.len()
    }

    /// Run a single detection attempt and apply its result.
    ///
    /// Without a detector this is a no-op. When the detector reports a
    /// platform different from the stored one, the new platform is stored and
    /// every change callback runs in registration order. An answer that
    /// arrives after a newer attempt has already been applied is discarded.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::AutoDetect`] if the detector fails; the platform is
    ///   left unchanged.
    /// - [`ConfigError::OnChange`] for the first failing callback; later
    ///   callbacks are skipped but the new platform is still stored.
    pub async fn auto_detect(&self) -> ConfigResult<()> {
        let Some(detector) = self.auto_detect.as_ref() else {
            trace!("no platform detector configured, skipping auto-detection");
            return Ok(());
        };

        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        trace!({ fields::ATTEMPT } = attempt, "auto-detecting the platform");
        let detected = detector.platform().await?;
        self.apply_platform(attempt, detected)
    }

    /// Start continuous detection in the background.
    ///
    /// The first attempt runs immediately, then one per
    /// [`auto_detect_frequency`](Self::auto_detect_frequency). Failed attempts
    /// are logged and the loop keeps going. With
    /// [`AutoDetectPolicy::UntilResolved`] the loop ends once the platform is
    /// known; otherwise it runs until the returned handle is stopped or
    /// dropped.
    ///
    /// Without a detector nothing is spawned and the returned handle is
    /// already finished.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_auto_detect(self: &Arc<Self>) -> AutoDetectHandle {
        if self.auto_detect.is_none() {
            debug!("no platform detector configured, auto-detection not started");
            return AutoDetectHandle::idle();
        }

        detect::spawn_auto_detect(Arc::clone(self))
    }

    fn apply_platform(&self, attempt: u64, detected: Platform) -> ConfigResult<()> {
        let state = self.state.lock();

        if attempt < state.applied_attempt.get() {
            trace!(
                { fields::ATTEMPT } = attempt,
                { fields::PLATFORM } = display(detected),
                "discarding platform from an outdated attempt"
            );
            return Ok(());
        }
        state.applied_attempt.set(attempt);

        let previous = state.platform.get();
        if previous == detected {
            trace!({ fields::PLATFORM } = display(detected), "platform unchanged");
            return Ok(());
        }

        info!(
            { fields::PREVIOUS_PLATFORM } = display(previous),
            { fields::PLATFORM } = display(detected),
            "platform changed"
        );
        state.platform.set(detected);
        self.notify_change()
    }

    fn notify_change(&self) -> ConfigResult<()> {
        for (index, callback) in self.on_change.iter().enumerate() {
            if let Err(source) = callback() {
                warn!(
                    { fields::CALLBACK_INDEX } = index,
                    { fields::ERROR } = display(&source),
                    "change callback failed"
                );
                return Err(ConfigError::on_change(index, source));
            }
        }
        Ok(())
    }
}

impl Default for Configuration {
    fn default() -> Self {
        ConfigurationBuilder::new().build()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("collector_image", &self.collector_image)
            .field("collector_config_map_entry", &self.collector_config_map_entry)
            .field("platform", &self.platform())
            .field("version", &self.version)
            .field("auto_detect", &self.auto_detect.is_some())
            .field("auto_detect_frequency", &self.auto_detect_frequency)
            .field("auto_detect_policy", &self.auto_detect_policy)
            .field("on_change", &self.on_change.len())
            .finish()
    }
}
