//! Operator configuration with platform auto-detection.
//!
//! This crate provides the [`Configuration`] shared by the operator's
//! controllers. It holds the collector image and config map entry, and it
//! resolves the deployment [`Platform`](otelop_core::Platform) through an
//! injected [`AutoDetect`](otelop_core::AutoDetect) capability:
//!
//! - [`options`] - Composable mutators applied left to right at construction
//! - [`Configuration::auto_detect`] - One detection attempt, applied on change
//! - [`Configuration::start_auto_detect`] - Background polling at a fixed interval
//! - [`SettingsLoader`] - File and environment settings turned into options
//!
//! Change callbacks registered with [`options::on_change`] fire once per
//! platform transition, in registration order.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use otelop_config::{options, Configuration};
//! use otelop_core::{Platform, StaticAutoDetect};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Arc::new(Configuration::new([
//!         options::auto_detect(StaticAutoDetect(Platform::OpenShift)),
//!         options::auto_detect_frequency(Duration::from_secs(5)),
//!         options::on_change(|| {
//!             tracing::info!("reconciling for the new platform");
//!             Ok(())
//!         }),
//!     ]));
//!
//!     let detection = config.start_auto_detect();
//!
//!     // ... run the controllers, reading config.platform() ...
//!
//!     detection.stop().await;
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod detect;
mod error;
pub mod options;
mod settings;

pub use config::{
    Configuration, DEFAULT_AUTO_DETECT_FREQUENCY, DEFAULT_COLLECTOR_CONFIG_MAP_ENTRY,
    DEFAULT_COLLECTOR_IMAGE_BASE,
};
pub use detect::{AutoDetectHandle, AutoDetectPolicy, ParsePolicyError};
pub use error::{ConfigError, ConfigResult};
pub use options::{ChangeCallback, ConfigOption, ConfigurationBuilder};
pub use settings::{OperatorSettings, SettingsLoader};
