//! Composable configuration options.
//!
//! Each function in this module returns a [`ConfigOption`] that sets one field
//! of a configuration under construction. Options are applied left to right,
//! so a later option overrides an earlier one for the same field, except
//! [`on_change`], which appends a callback.
//!
//! # Example
//!
//! ```
//! use otelop_config::{options, Configuration};
//! use otelop_core::Platform;
//!
//! let config = Configuration::new([
//!     options::collector_image("some-image"),
//!     options::collector_config_map_entry("some-config.yaml"),
//!     options::platform(Platform::Kubernetes),
//! ]);
//!
//! assert_eq!(config.collector_image(), "some-image");
//! assert_eq!(config.collector_config_map_entry(), "some-config.yaml");
//! assert_eq!(config.platform(), Platform::Kubernetes);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use otelop_core::{AutoDetect, BoxError, Platform, Version};

use crate::config::{
    Configuration, DEFAULT_AUTO_DETECT_FREQUENCY, DEFAULT_COLLECTOR_CONFIG_MAP_ENTRY,
    DEFAULT_COLLECTOR_IMAGE_BASE,
};
use crate::detect::AutoDetectPolicy;

/// Callback invoked when the detected platform changes.
pub type ChangeCallback = Arc<dyn Fn() -> Result<(), BoxError> + Send + Sync>;

/// A single mutation of a configuration under construction.
#[derive(Clone)]
pub enum ConfigOption {
    /// Sets the collector image.
    CollectorImage(String),
    /// Sets the config map entry holding the collector configuration.
    CollectorConfigMapEntry(String),
    /// Sets the initial platform.
    Platform(Platform),
    /// Sets the platform detector.
    AutoDetect(Arc<dyn AutoDetect>),
    /// Sets the polling interval of continuous detection.
    AutoDetectFrequency(Duration),
    /// Sets when continuous detection stops.
    AutoDetectPolicy(AutoDetectPolicy),
    /// Sets the version used to compose the default image.
    Version(Version),
    /// Appends a change callback.
    OnChange(ChangeCallback),
}

impl fmt::Debug for ConfigOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CollectorImage(image) => f.debug_tuple("CollectorImage").field(image).finish(),
            Self::CollectorConfigMapEntry(entry) => {
                f.debug_tuple("CollectorConfigMapEntry").field(entry).finish()
            }
            Self::Platform(platform) => f.debug_tuple("Platform").field(platform).finish(),
            Self::AutoDetect(_) => f.write_str("AutoDetect(..)"),
            Self::AutoDetectFrequency(frequency) => {
                f.debug_tuple("AutoDetectFrequency").field(frequency).finish()
            }
            Self::AutoDetectPolicy(policy) => {
                f.debug_tuple("AutoDetectPolicy").field(policy).finish()
            }
            Self::Version(version) => f.debug_tuple("Version").field(version).finish(),
            Self::OnChange(_) => f.write_str("OnChange(..)"),
        }
    }
}

/// Sets the collector image.
pub fn collector_image(image: impl Into<String>) -> ConfigOption {
    ConfigOption::CollectorImage(image.into())
}

/// Sets the config map entry holding the collector configuration.
pub fn collector_config_map_entry(entry: impl Into<String>) -> ConfigOption {
    ConfigOption::CollectorConfigMapEntry(entry.into())
}

/// Sets the initial platform.
pub fn platform(platform: Platform) -> ConfigOption {
    ConfigOption::Platform(platform)
}

/// Sets the platform detector.
pub fn auto_detect(detector: impl AutoDetect + 'static) -> ConfigOption {
    ConfigOption::AutoDetect(Arc::new(detector))
}

/// Sets an already shared platform detector.
pub fn auto_detect_arc(detector: Arc<dyn AutoDetect>) -> ConfigOption {
    ConfigOption::AutoDetect(detector)
}

/// Sets the polling interval of continuous detection.
pub fn auto_detect_frequency(frequency: Duration) -> ConfigOption {
    ConfigOption::AutoDetectFrequency(frequency)
}

/// Sets when continuous detection stops.
pub fn auto_detect_policy(policy: AutoDetectPolicy) -> ConfigOption {
    ConfigOption::AutoDetectPolicy(policy)
}

/// Sets the version used to compose the default collector image.
pub fn version(version: Version) -> ConfigOption {
    ConfigOption::Version(version)
}

/// Appends a callback invoked whenever the detected platform changes.
///
/// Callbacks run in registration order; the first error stops the dispatch.
/// Any `std::error::Error + Send + Sync` converts into [`BoxError`] with `?`
/// or `.into()` inside the closure.
pub fn on_change<F>(callback: F) -> ConfigOption
where
    F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
{
    ConfigOption::OnChange(Arc::new(callback))
}

/// Builder for a [`Configuration`].
///
/// # Example
///
/// ```
/// use otelop_config::ConfigurationBuilder;
/// use std::time::Duration;
///
/// let config = ConfigurationBuilder::new()
///     .with_collector_config_map_entry("relay.yaml")
///     .with_auto_detect_frequency(Duration::from_secs(1))
///     .build();
///
/// assert_eq!(config.collector_config_map_entry(), "relay.yaml");
/// ```
pub struct ConfigurationBuilder {
    pub(crate) collector_image: Option<String>,
    pub(crate) collector_config_map_entry: String,
    pub(crate) platform: Platform,
    pub(crate) auto_detect: Option<Arc<dyn AutoDetect>>,
    pub(crate) auto_detect_frequency: Duration,
    pub(crate) auto_detect_policy: AutoDetectPolicy,
    pub(crate) on_change: Vec<ChangeCallback>,
    pub(crate) version: Version,
}

impl ConfigurationBuilder {
    /// Create a builder holding the default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            collector_image: None,
            collector_config_map_entry: DEFAULT_COLLECTOR_CONFIG_MAP_ENTRY.to_string(),
            platform: Platform::Unknown,
            auto_detect: None,
            auto_detect_frequency: DEFAULT_AUTO_DETECT_FREQUENCY,
            auto_detect_policy: AutoDetectPolicy::default(),
            on_change: Vec::new(),
            version: Version::current(),
        }
    }

    /// Apply a single option.
    #[must_use]
    pub fn apply(mut self, option: ConfigOption) -> Self {
        match option {
            ConfigOption::CollectorImage(image) => self.collector_image = Some(image),
            ConfigOption::CollectorConfigMapEntry(entry) => {
                self.collector_config_map_entry = entry;
            }
            ConfigOption::Platform(platform) => self.platform = platform,
            ConfigOption::AutoDetect(detector) => self.auto_detect = Some(detector),
            ConfigOption::AutoDetectFrequency(frequency) => {
                self.auto_detect_frequency = frequency;
            }
            ConfigOption::AutoDetectPolicy(policy) => self.auto_detect_policy = policy,
            ConfigOption::Version(version) => self.version = version,
            ConfigOption::OnChange(callback) => self.on_change.push(callback),
        }
        self
    }

    /// Apply options in order.
    #[must_use]
    pub fn apply_all<I>(self, options: I) -> Self
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        options.into_iter().fold(self, Self::apply)
    }

    /// Set the collector image.
    #[must_use]
    pub fn with_collector_image(self, image: impl Into<String>) -> Self {
        self.apply(collector_image(image))
    }

    /// Set the config map entry.
    #[must_use]
    pub fn with_collector_config_map_entry(self, entry: impl Into<String>) -> Self {
        self.apply(collector_config_map_entry(entry))
    }

    /// Set the initial platform.
    #[must_use]
    pub fn with_platform(self, value: Platform) -> Self {
        self.apply(platform(value))
    }

    /// Set the platform detector.
    #[must_use]
    pub fn with_auto_detect(self, detector: impl AutoDetect + 'static) -> Self {
        self.apply(auto_detect(detector))
    }

    /// Set the polling interval.
    #[must_use]
    pub fn with_auto_detect_frequency(self, frequency: Duration) -> Self {
        self.apply(auto_detect_frequency(frequency))
    }

    /// Set the detection loop policy.
    #[must_use]
    pub fn with_auto_detect_policy(self, policy: AutoDetectPolicy) -> Self {
        self.apply(auto_detect_policy(policy))
    }

    /// Set the version.
    #[must_use]
    pub fn with_version(self, value: Version) -> Self {
        self.apply(version(value))
    }

    /// Append a change callback.
    #[must_use]
    pub fn with_on_change<F>(self, callback: F) -> Self
    where
        F: Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.apply(on_change(callback))
    }

    /// Finalize the configuration.
    ///
    /// When no image was set, the image is composed from the default base
    /// image and the collector version.
    #[must_use]
    pub fn build(self) -> Configuration {
        let collector_image = self
            .collector_image
            .clone()
            .unwrap_or_else(|| default_collector_image(&self.version));
        Configuration::from_parts(self, collector_image)
    }
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfigurationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationBuilder")
            .field("collector_image", &self.collector_image)
            .field("collector_config_map_entry", &self.collector_config_map_entry)
            .field("platform", &self.platform)
            .field("auto_detect", &self.auto_detect.is_some())
            .field("auto_detect_frequency", &self.auto_detect_frequency)
            .field("auto_detect_policy", &self.auto_detect_policy)
            .field("on_change", &self.on_change.len())
            .field("version", &self.version)
            .finish()
    }
}

fn default_collector_image(version: &Version) -> String {
    format!("{DEFAULT_COLLECTOR_IMAGE_BASE}:v{}", version.collector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use otelop_core::StaticAutoDetect;

    fn version_with_collector(collector: &str) -> Version {
        Version {
            collector: collector.to_string(),
            ..Version::current()
        }
    }

    #[test]
    fn test_builder_defaults() {
        let builder = ConfigurationBuilder::new();
        assert!(builder.collector_image.is_none());
        assert_eq!(builder.collector_config_map_entry, "collector.yaml");
        assert_eq!(builder.platform, Platform::Unknown);
        assert!(builder.auto_detect.is_none());
        assert_eq!(builder.auto_detect_frequency, Duration::from_secs(5));
        assert_eq!(builder.auto_detect_policy, AutoDetectPolicy::Continuous);
        assert!(builder.on_change.is_empty());
    }

    #[test]
    fn test_later_option_wins() {
        let builder = ConfigurationBuilder::new().apply_all([
            platform(Platform::Kubernetes),
            collector_image("first"),
            platform(Platform::OpenShift),
            collector_image("second"),
        ]);
        assert_eq!(builder.platform, Platform::OpenShift);
        assert_eq!(builder.collector_image.as_deref(), Some("second"));
    }

    #[test]
    fn test_on_change_appends() {
        let builder = ConfigurationBuilder::new()
            .apply(on_change(|| Ok(())))
            .apply(on_change(|| Ok(())))
            .with_on_change(|| Err("boom".into()));
        assert_eq!(builder.on_change.len(), 3);
    }

    #[test]
    fn test_on_change_propagates_typed_errors() {
        let builder = ConfigurationBuilder::new().apply(on_change(|| {
            "not-a-port".parse::<u16>()?;
            Ok(())
        }));

        let err = (builder.on_change[0])().unwrap_err();
        assert!(err.downcast_ref::<std::num::ParseIntError>().is_some());
    }

    #[test]
    fn test_default_image_uses_version() {
        let config = ConfigurationBuilder::new()
            .with_version(version_with_collector("0.40.0"))
            .build();
        assert_eq!(
            config.collector_image(),
            "quay.io/opentelemetry/opentelemetry-collector:v0.40.0"
        );
    }

    #[test]
    fn test_explicit_image_overrides_version() {
        let config = ConfigurationBuilder::new()
            .with_version(version_with_collector("0.40.0"))
            .with_collector_image("custom/collector:latest")
            .build();
        assert_eq!(config.collector_image(), "custom/collector:latest");
    }

    #[test]
    fn test_empty_image_is_kept() {
        let config = ConfigurationBuilder::new().with_collector_image("").build();
        assert_eq!(config.collector_image(), "");
    }

    #[test]
    fn test_option_debug_hides_closures() {
        let rendered = format!("{:?}", on_change(|| Ok(())));
        assert_eq!(rendered, "OnChange(..)");

        let rendered = format!("{:?}", auto_detect(StaticAutoDetect(Platform::OpenShift)));
        assert_eq!(rendered, "AutoDetect(..)");

        let rendered = format!("{:?}", collector_image("img"));
        assert!(rendered.contains("img"));
    }
}
