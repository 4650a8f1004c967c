//! Continuous platform detection.
//!
//! [`Configuration::start_auto_detect`] spawns a periodic task that repeats
//! the one-shot detection at a fixed interval. The task is controlled through
//! the returned [`AutoDetectHandle`].

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use otelop_telemetry::logging::fields;
use tracing::field::{debug as debug_value, display};
use tracing::{debug, info, warn};

use crate::config::{Configuration, DEFAULT_AUTO_DETECT_FREQUENCY};

/// When the detection loop stops on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoDetectPolicy {
    /// Keep polling until stopped. Callbacks still fire only on real changes.
    #[default]
    Continuous,
    /// Stop after the first attempt that leaves the platform known.
    UntilResolved,
}

impl FromStr for AutoDetectPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continuous" => Ok(Self::Continuous),
            "until_resolved" | "until-resolved" => Ok(Self::UntilResolved),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// Error returned when a string does not name an auto-detection policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown auto-detect policy {0:?}, expected \"continuous\" or \"until_resolved\"")]
pub struct ParsePolicyError(String);

/// Handle to a running detection loop.
///
/// Dropping the handle signals the loop to stop.
#[must_use = "dropping the handle stops auto-detection"]
#[derive(Debug)]
pub struct AutoDetectHandle {
    shutdown_tx: Option<mpsc::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl AutoDetectHandle {
    pub(crate) fn idle() -> Self {
        Self {
            shutdown_tx: None,
            task: None,
        }
    }

    /// Whether the loop is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the loop and wait for it to exit.
    ///
    /// An attempt in flight is abandoned before its result is applied; an
    /// update that is already being applied completes first.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Wait for the loop to end on its own.
    ///
    /// With [`AutoDetectPolicy::Continuous`] this never returns; with
    /// [`AutoDetectPolicy::UntilResolved`] it returns once the platform is
    /// known.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for AutoDetectHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.try_send(());
        }
    }
}

pub(crate) fn spawn_auto_detect(config: Arc<Configuration>) -> AutoDetectHandle {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
    let period = effective_frequency(config.auto_detect_frequency());
    let policy = config.auto_detect_policy();

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            { fields::FREQUENCY_MS } = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            { fields::POLICY } = debug_value(policy),
            "platform auto-detection started"
        );

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = interval.tick() => {}
            }

            tokio::select! {
                _ = shutdown_rx.recv() => break,
                result = config.auto_detect() => {
                    if let Err(e) = result {
                        warn!({ fields::ERROR } = display(&e), "platform auto-detection failed");
                    }
                }
            }

            if policy == AutoDetectPolicy::UntilResolved && config.platform().is_known() {
                info!(
                    { fields::PLATFORM } = display(config.platform()),
                    "platform resolved, auto-detection finished"
                );
                return;
            }
        }

        debug!("platform auto-detection received shutdown signal");
    });

    AutoDetectHandle {
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    }
}

fn effective_frequency(frequency: Duration) -> Duration {
    if frequency.is_zero() {
        warn!(
            default = ?DEFAULT_AUTO_DETECT_FREQUENCY,
            "auto-detection frequency is zero, using the default"
        );
        DEFAULT_AUTO_DETECT_FREQUENCY
    } else {
        frequency
    }
}
