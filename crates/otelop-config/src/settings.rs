//! Layered loading of operator settings.
//!
//! [`SettingsLoader`] reads the statically configurable fields from a TOML or
//! JSON document and from environment variables, then turns them into
//! [`ConfigOption`]s:
//!
//! 1. Default values (nothing set)
//! 2. Settings file (TOML or JSON)
//! 3. Environment variables
//!
//! Later layers override earlier ones per field.
//!
//! # Example
//!
//! ```no_run
//! use otelop_config::{Configuration, SettingsLoader};
//!
//! # fn main() -> Result<(), otelop_config::ConfigError> {
//! let settings = SettingsLoader::new()
//!     .with_optional_file("otelop.toml")?
//!     .with_env_prefix("OTELOP")
//!     .load()?;
//!
//! let config = Configuration::new(settings.into_options());
//! # Ok(())
//! # }
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `OTELOP__COLLECTOR_IMAGE=quay.io/acme/collector:1.0`
//! - `OTELOP__COLLECTOR_CONFIG_MAP_ENTRY=relay.yaml`
//! - `OTELOP__PLATFORM=openshift`
//! - `OTELOP__AUTO_DETECT_FREQUENCY_MS=10000`
//! - `OTELOP__AUTO_DETECT_POLICY=until_resolved`

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use otelop_core::Platform;
use serde::{Deserialize, Serialize};

use crate::detect::AutoDetectPolicy;
use crate::error::{ConfigError, ConfigResult};
use crate::options::{self, ConfigOption};

/// Statically configurable operator settings.
///
/// Every field is optional; unset fields keep the configuration defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperatorSettings {
    /// Collector image to deploy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector_image: Option<String>,

    /// Config map entry holding the collector configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector_config_map_entry: Option<String>,

    /// Initial platform, before any detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    /// Polling interval of continuous detection, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_detect_frequency_ms: Option<u64>,

    /// When continuous detection stops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_detect_policy: Option<AutoDetectPolicy>,
}

impl OperatorSettings {
    /// Convert the set fields into configuration options, in field order.
    pub fn into_options(self) -> Vec<ConfigOption> {
        let mut opts = Vec::new();
        if let Some(image) = self.collector_image {
            opts.push(options::collector_image(image));
        }
        if let Some(entry) = self.collector_config_map_entry {
            opts.push(options::collector_config_map_entry(entry));
        }
        if let Some(platform) = self.platform {
            opts.push(options::platform(platform));
        }
        if let Some(ms) = self.auto_detect_frequency_ms {
            opts.push(options::auto_detect_frequency(Duration::from_millis(ms)));
        }
        if let Some(policy) = self.auto_detect_policy {
            opts.push(options::auto_detect_policy(policy));
        }
        opts
    }

    // Fields set in `other` replace ours.
    fn merge(&mut self, other: Self) {
        if other.collector_image.is_some() {
            self.collector_image = other.collector_image;
        }
        if other.collector_config_map_entry.is_some() {
            self.collector_config_map_entry = other.collector_config_map_entry;
        }
        if other.platform.is_some() {
            self.platform = other.platform;
        }
        if other.auto_detect_frequency_ms.is_some() {
            self.auto_detect_frequency_ms = other.auto_detect_frequency_ms;
        }
        if other.auto_detect_policy.is_some() {
            self.auto_detect_policy = other.auto_detect_policy;
        }
    }
}

/// Settings loader with layered approach.
#[derive(Debug, Default)]
pub struct SettingsLoader {
    settings: OperatorSettings,
    env_prefix: Option<String>,
}

impl SettingsLoader {
    /// Create a new loader with nothing set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a file.
    ///
    /// The format is chosen by extension (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file does not exist, cannot be read,
    /// has an unsupported extension, or fails to parse.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> ConfigResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        let file_settings = match extension.as_deref() {
            Some(format @ ("toml" | "json")) => Self::parse(&content, format)?,
            _ => return Err(ConfigError::unsupported_format(path.display().to_string())),
        };

        self.settings.merge(file_settings);
        Ok(self)
    }

    /// Load settings from a file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> ConfigResult<Self> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load settings from a string in the given format ("toml" or "json").
    ///
    /// # Example
    ///
    /// ```
    /// use otelop_config::SettingsLoader;
    /// use otelop_core::Platform;
    ///
    /// let settings = SettingsLoader::new()
    ///     .with_string("platform = \"openshift\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(settings.platform, Some(Platform::OpenShift));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> ConfigResult<Self> {
        let parsed = Self::parse(content, &format.to_lowercase())?;
        self.settings.merge(parsed);
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__FIELD`, e.g. `OTELOP__PLATFORM`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file into the process environment, if present.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        let _ = dotenvy::dotenv();
        self
    }

    /// Apply environment overrides and return the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EnvParseError` for an unknown key under the
    /// prefix or a value that does not parse.
    pub fn load(mut self) -> ConfigResult<OperatorSettings> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_vars(&prefix, env::vars())?;
        }
        Ok(self.settings)
    }

    fn parse(content: &str, format: &str) -> ConfigResult<OperatorSettings> {
        match format {
            "toml" => Ok(toml::from_str(content)?),
            "json" => Ok(serde_json::from_str(content)?),
            other => Err(ConfigError::unsupported_format(other)),
        }
    }

    fn apply_env_vars<I>(&mut self, prefix: &str, vars: I) -> ConfigResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let marker = format!("{prefix}__");
        for (key, value) in vars {
            if let Some(field) = key.strip_prefix(&marker) {
                self.apply_env_var(&key, field, &value)?;
            }
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, field: &str, value: &str) -> ConfigResult<()> {
        match field {
            "COLLECTOR_IMAGE" => {
                self.settings.collector_image = Some(value.to_string());
            }
            "COLLECTOR_CONFIG_MAP_ENTRY" => {
                self.settings.collector_config_map_entry = Some(value.to_string());
            }
            "PLATFORM" => {
                let platform = value
                    .parse::<Platform>()
                    .map_err(|e| ConfigError::env_parse_error(key, e.to_string()))?;
                self.settings.platform = Some(platform);
            }
            "AUTO_DETECT_FREQUENCY_MS" => {
                let ms = value
                    .parse::<u64>()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))?;
                self.settings.auto_detect_frequency_ms = Some(ms);
            }
            "AUTO_DETECT_POLICY" => {
                let policy = value
                    .parse::<AutoDetectPolicy>()
                    .map_err(|e| ConfigError::env_parse_error(key, e.to_string()))?;
                self.settings.auto_detect_policy = Some(policy);
            }
            _ => return Err(ConfigError::env_parse_error(key, "unknown setting")),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Configuration;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_empty_settings_yield_no_options() {
        let settings = SettingsLoader::new().load().unwrap();
        assert_eq!(settings, OperatorSettings::default());
        assert!(settings.into_options().is_empty());
    }

    #[test]
    fn test_toml_string() {
        let toml = r#"
            collector_image = "quay.io/acme/collector:1.0"
            collector_config_map_entry = "relay.yaml"
            platform = "kubernetes"
            auto_detect_frequency_ms = 1500
            auto_detect_policy = "until_resolved"
        "#;

        let settings = SettingsLoader::new()
            .with_string(toml, "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(settings.collector_image.as_deref(), Some("quay.io/acme/collector:1.0"));
        assert_eq!(settings.collector_config_map_entry.as_deref(), Some("relay.yaml"));
        assert_eq!(settings.platform, Some(Platform::Kubernetes));
        assert_eq!(settings.auto_detect_frequency_ms, Some(1500));
        assert_eq!(settings.auto_detect_policy, Some(AutoDetectPolicy::UntilResolved));
    }

    #[test]
    fn test_json_string() {
        let settings = SettingsLoader::new()
            .with_string(r#"{"platform": "openshift"}"#, "JSON")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(settings.platform, Some(Platform::OpenShift));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = SettingsLoader::new().with_string("replicas = 3", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_unsupported_format() {
        let result = SettingsLoader::new().with_string("platform: openshift", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_later_string_overrides_per_field() {
        let settings = SettingsLoader::new()
            .with_string("collector_image = \"a\"\nplatform = \"kubernetes\"", "toml")
            .unwrap()
            .with_string("platform = \"openshift\"", "toml")
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(settings.collector_image.as_deref(), Some("a"));
        assert_eq!(settings.platform, Some(Platform::OpenShift));
    }

    #[test]
    fn test_file_loading() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("otelop.toml");
        fs::write(&path, "collector_config_map_entry = \"from-file.yaml\"").unwrap();

        let settings = SettingsLoader::new().with_file(&path).unwrap().load().unwrap();
        assert_eq!(
            settings.collector_config_map_entry.as_deref(),
            Some("from-file.yaml")
        );
    }

    #[test]
    fn test_file_not_found() {
        let result = SettingsLoader::new().with_file("/nonexistent/otelop.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_optional_file_missing() {
        let settings = SettingsLoader::new()
            .with_optional_file("/nonexistent/otelop.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(settings, OperatorSettings::default());
    }

    #[test]
    fn test_file_with_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("otelop.yaml");
        fs::write(&path, "platform: openshift").unwrap();

        let result = SettingsLoader::new().with_file(&path);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut loader = SettingsLoader::new()
            .with_string("platform = \"kubernetes\"\ncollector_image = \"a\"", "toml")
            .unwrap();

        loader
            .apply_env_vars(
                "OTELOP",
                vars(&[
                    ("OTELOP__PLATFORM", "OpenShift"),
                    ("OTELOP__AUTO_DETECT_FREQUENCY_MS", "250"),
                    ("OTELOP__AUTO_DETECT_POLICY", "until_resolved"),
                    ("UNRELATED", "ignored"),
                ]),
            )
            .unwrap();

        let settings = loader.load().unwrap();
        assert_eq!(settings.platform, Some(Platform::OpenShift));
        assert_eq!(settings.collector_image.as_deref(), Some("a"));
        assert_eq!(settings.auto_detect_frequency_ms, Some(250));
        assert_eq!(settings.auto_detect_policy, Some(AutoDetectPolicy::UntilResolved));
    }

    #[test]
    fn test_env_invalid_values() {
        let mut loader = SettingsLoader::new();
        let err = loader
            .apply_env_vars("OTELOP", vars(&[("OTELOP__PLATFORM", "nomad")]))
            .unwrap_err();
        assert!(err.to_string().contains("OTELOP__PLATFORM"));

        let err = loader
            .apply_env_vars("OTELOP", vars(&[("OTELOP__AUTO_DETECT_FREQUENCY_MS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("expected integer"));

        let err = loader
            .apply_env_vars("OTELOP", vars(&[("OTELOP__REPLICAS", "3")]))
            .unwrap_err();
        assert!(err.to_string().contains("unknown setting"));
    }

    #[test]
    fn test_env_prefix_from_process() {
        std::env::set_var("OTELOP_SETTINGS_TEST__COLLECTOR_IMAGE", "env/collector:2");

        let settings = SettingsLoader::new()
            .with_env_prefix("otelop_settings_test")
            .load()
            .unwrap();

        std::env::remove_var("OTELOP_SETTINGS_TEST__COLLECTOR_IMAGE");
        assert_eq!(settings.collector_image.as_deref(), Some("env/collector:2"));
    }

    #[test]
    fn test_settings_into_configuration() {
        let settings = OperatorSettings {
            collector_image: Some("img".to_string()),
            platform: Some(Platform::Kubernetes),
            auto_detect_frequency_ms: Some(100),
            ..Default::default()
        };

        let config = Configuration::new(settings.into_options());
        assert_eq!(config.collector_image(), "img");
        assert_eq!(config.platform(), Platform::Kubernetes);
        assert_eq!(config.auto_detect_frequency(), Duration::from_millis(100));
        assert_eq!(config.collector_config_map_entry(), "collector.yaml");
    }
}
