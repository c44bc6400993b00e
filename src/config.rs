//! Configuration for Wardwatch.
//!
//! Two layers live here:
//!
//! - [`DetectionConfig`]: the operator-tunable detection and alerting policy,
//!   read by the simulator on every generation attempt.
//! - [`ServerConfig`]: process settings read once from the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::EventKind;

/// Default port if not specified via environment variable.
pub const DEFAULT_PORT: u16 = 3000;

/// Default length of one simulation time unit.
pub const DEFAULT_TICK_MS: u64 = 1000;

/// Room selected at startup unless overridden.
pub const DEFAULT_SELECTED_ROOM: &str = "BED-101";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallDetectionConfig {
    pub enabled: bool,
    pub hip_drop_threshold: f64,
    pub angle_change_threshold: f64,
    pub sustained_frames: u32,
    pub confidence_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskyBehaviorConfig {
    pub enabled: bool,
    pub bed_exit_enabled: bool,
    pub wandering_enabled: bool,
    pub tubing_removal_enabled: bool,
    pub confidence_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistressDetectionConfig {
    pub enabled: bool,
    pub emotion_threshold: f64,
    pub sustained_seconds: u32,
    pub confidence_threshold: f64,
}

/// Alerting policy shared by all detectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertingConfig {
    /// Minimum time between two generated alerts for the same room.
    pub cooldown_seconds: u64,
    pub escalation_enabled: bool,
    pub sound_enabled: bool,
    /// Age at which an unacknowledged alert is raised one severity level.
    pub escalation_delay_seconds: u64,
}

/// Detection and alerting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub fall_detection: FallDetectionConfig,
    pub risky_behavior: RiskyBehaviorConfig,
    pub distress_detection: DistressDetectionConfig,
    pub alerting: AlertingConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            fall_detection: FallDetectionConfig {
                enabled: true,
                hip_drop_threshold: 80.0,
                angle_change_threshold: 45.0,
                sustained_frames: 5,
                confidence_threshold: 0.75,
            },
            risky_behavior: RiskyBehaviorConfig {
                enabled: true,
                bed_exit_enabled: true,
                wandering_enabled: true,
                tubing_removal_enabled: true,
                confidence_threshold: 0.7,
            },
            distress_detection: DistressDetectionConfig {
                enabled: true,
                emotion_threshold: 0.6,
                sustained_seconds: 5,
                confidence_threshold: 0.65,
            },
            alerting: AlertingConfig {
                cooldown_seconds: 30,
                escalation_enabled: true,
                sound_enabled: true,
                escalation_delay_seconds: 60,
            },
        }
    }
}

impl DetectionConfig {
    /// Check that every threshold is a finite value in `[0, 1]`.
    ///
    /// Cooldown and escalation delay are unsigned and need no check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratios = [
            (
                "fall_detection.confidence_threshold",
                self.fall_detection.confidence_threshold,
            ),
            (
                "risky_behavior.confidence_threshold",
                self.risky_behavior.confidence_threshold,
            ),
            (
                "distress_detection.confidence_threshold",
                self.distress_detection.confidence_threshold,
            ),
            (
                "distress_detection.emotion_threshold",
                self.distress_detection.emotion_threshold,
            ),
        ];

        for (field, value) in ratios {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ThresholdOutOfRange { field, value });
            }
        }

        Ok(())
    }

    /// Detectors that may currently raise alerts, in a stable order.
    pub fn enabled_detectors(&self) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }

    pub fn is_enabled(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Fall => self.fall_detection.enabled,
            EventKind::RiskyBehavior => self.risky_behavior.enabled,
            EventKind::Distress => self.distress_detection.enabled,
        }
    }

    /// Minimum confidence for alerts produced by this detector.
    pub fn confidence_threshold(&self, kind: EventKind) -> f64 {
        match kind {
            EventKind::Fall => self.fall_detection.confidence_threshold,
            EventKind::RiskyBehavior => self.risky_behavior.confidence_threshold,
            EventKind::Distress => self.distress_detection.confidence_threshold,
        }
    }

    pub fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::seconds(saturating_secs(self.alerting.cooldown_seconds))
    }

    pub fn escalation_delay(&self) -> chrono::Duration {
        chrono::Duration::seconds(saturating_secs(self.alerting.escalation_delay_seconds))
    }
}

/// Largest second count `chrono::Duration::seconds` accepts.
const MAX_DURATION_SECS: i64 = i64::MAX / 1000;

fn saturating_secs(secs: u64) -> i64 {
    i64::try_from(secs)
        .unwrap_or(MAX_DURATION_SECS)
        .min(MAX_DURATION_SECS)
}

/// Process-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,

    /// RNG seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,

    /// Length of one simulation time unit.
    pub tick: Duration,

    /// When false the audio sink reports itself unavailable.
    pub audio_enabled: bool,

    pub selected_room: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            seed: None,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            audio_enabled: true,
            selected_room: DEFAULT_SELECTED_ROOM.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = lookup("WARDWATCH_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let seed = lookup("WARDWATCH_SEED").and_then(|s| s.parse().ok());

        let tick = lookup("WARDWATCH_TICK_MS")
            .and_then(|t| t.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick);

        let audio_enabled = lookup("WARDWATCH_AUDIO")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "off" | "false" | "0"))
            .unwrap_or(defaults.audio_enabled);

        let selected_room = lookup("WARDWATCH_SELECTED_ROOM")
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(defaults.selected_room);

        Self {
            port,
            seed,
            tick,
            audio_enabled,
            selected_room,
        }
    }
}
