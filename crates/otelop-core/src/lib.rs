//! # otelop Core
//!
//! Core types and capabilities shared by the otelop operator crates.
//!
//! This crate provides the contracts the configuration layer is built on:
//!
//! - [`Platform`] - The deployment platform the operator runs on
//! - [`AutoDetect`] - Capability that determines the current platform
//! - [`AutoDetectError`] - Failures reported by a detector
//! - [`Version`] - Build-time version information used to compose image names
//!
//! Detector implementations (API discovery, filesystem probes, ...) live outside
//! this crate and are injected through [`AutoDetect`].

#![doc(html_root_url = "https://docs.rs/otelop-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod autodetect;
mod platform;
mod version;

pub use autodetect::{AutoDetect, AutoDetectError, BoxError, FnAutoDetect, StaticAutoDetect};
pub use platform::{ParsePlatformError, Platform};
pub use version::Version;
