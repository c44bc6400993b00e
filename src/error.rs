//! Error types for Wardwatch.
//!
//! The simulator itself has very few failure modes: most invalid commands
//! (acknowledging an unknown alert, triggering an event on an offline room)
//! are silent no-ops. The errors below cover the remaining cases where a
//! caller needs to know that nothing happened.

use thiserror::Error;

/// A detection configuration that cannot be applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A threshold or ratio is outside `[0, 1]` (or is not finite).
    #[error("{field} must be within [0, 1], got {value}")]
    ThresholdOutOfRange { field: &'static str, value: f64 },
}

/// Errors returned by simulator commands.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulatorError {
    /// The referenced room is not part of the seeded room list.
    #[error("unknown room: {0}")]
    UnknownRoom(String),

    /// The submitted configuration was rejected.
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

/// Audio output failures.
///
/// These never propagate into simulator state; they are logged and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// No output device is available (disabled, denied, or unsupported).
    #[error("audio output unavailable: {0}")]
    Unavailable(String),
}
