//! Audio cues for alerts.
//!
//! The simulator never synthesizes sound itself. It asks an [`AudioSink`] to
//! play an [`AlertCue`], and each cue carries its tone plan (frequency,
//! waveform, gain envelope). The default [`ToneAudio`] sink renders cues as
//! tracing events, which is enough for a headless service; a sink backed by
//! a real output device can be swapped in without touching the simulator.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::AudioError;
use crate::model::AlertSeverity;

/// Oscillator waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Triangle,
}

/// A single tone: starts at `offset`, decays exponentially from `gain`
/// over `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tone {
    pub frequency_hz: f32,
    pub waveform: Waveform,
    pub gain: f32,
    pub duration: Duration,
    pub offset: Duration,
}

/// The three cues the dashboard uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCue {
    /// Two-tone siren that keeps sounding until stopped.
    Emergency,

    /// Rising double beep.
    Warning,

    /// Short, quiet ping.
    Soft,
}

impl AlertCue {
    /// Map an alert severity to its cue.
    pub fn for_severity(severity: AlertSeverity) -> Self {
        match severity {
            AlertSeverity::Critical => AlertCue::Emergency,
            AlertSeverity::High => AlertCue::Warning,
            AlertSeverity::Medium | AlertSeverity::Low => AlertCue::Soft,
        }
    }

    /// Tones making up one cycle of the cue.
    pub fn tones(&self) -> Vec<Tone> {
        match self {
            AlertCue::Emergency => vec![
                Tone {
                    frequency_hz: 880.0,
                    waveform: Waveform::Sine,
                    gain: 0.3,
                    duration: Duration::from_millis(300),
                    offset: Duration::ZERO,
                },
                Tone {
                    frequency_hz: 660.0,
                    waveform: Waveform::Sine,
                    gain: 0.3,
                    duration: Duration::from_millis(300),
                    offset: Duration::from_millis(350),
                },
            ],
            AlertCue::Warning => vec![
                Tone {
                    frequency_hz: 440.0,
                    waveform: Waveform::Triangle,
                    gain: 0.2,
                    duration: Duration::from_millis(500),
                    offset: Duration::ZERO,
                },
                Tone {
                    frequency_hz: 520.0,
                    waveform: Waveform::Triangle,
                    gain: 0.2,
                    duration: Duration::from_millis(500),
                    offset: Duration::from_millis(200),
                },
            ],
            AlertCue::Soft => vec![Tone {
                frequency_hz: 600.0,
                waveform: Waveform::Sine,
                gain: 0.15,
                duration: Duration::from_millis(200),
                offset: Duration::ZERO,
            }],
        }
    }

    /// Interval between tones for looping cues; `None` for one-shots.
    pub fn repeat_interval(&self) -> Option<Duration> {
        match self {
            AlertCue::Emergency => Some(Duration::from_millis(350)),
            AlertCue::Warning | AlertCue::Soft => None,
        }
    }
}

/// Output for alert cues.
pub trait AudioSink: Send {
    /// Start a cue.
    ///
    /// For looping cues ([`AlertCue::repeat_interval`] is `Some`) the sink
    /// enters the playing state and stays there until [`AudioSink::stop`].
    /// Whether tones are actually re-emitted at that interval is up to the
    /// sink; [`ToneAudio`] logs the tone plan once.
    fn play(&mut self, cue: AlertCue) -> Result<(), AudioError>;

    /// Silence any looping cue. Must be idempotent.
    fn stop(&mut self);

    /// Whether a looping cue is currently sounding.
    fn is_playing(&self) -> bool;
}

/// Default sink: logs each cue's tone plan once and tracks whether the
/// looping siren is active. It does not re-log the siren every 350 ms.
#[derive(Debug, Clone, Default)]
pub struct ToneAudio {
    looping: Option<AlertCue>,
    unavailable: Option<String>,
}

impl ToneAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink with no output device; every `play` fails.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            looping: None,
            unavailable: Some(reason.into()),
        }
    }
}

impl AudioSink for ToneAudio {
    fn play(&mut self, cue: AlertCue) -> Result<(), AudioError> {
        if let Some(reason) = &self.unavailable {
            return Err(AudioError::Unavailable(reason.clone()));
        }

        if cue.repeat_interval().is_some() {
            // The siren does not restart while it is already sounding
            if self.looping.is_some() {
                debug!(?cue, "Looping cue already playing");
                return Ok(());
            }
            self.looping = Some(cue);
        }

        for tone in cue.tones() {
            debug!(
                frequency_hz = tone.frequency_hz,
                waveform = ?tone.waveform,
                gain = tone.gain,
                duration_ms = tone.duration.as_millis() as u64,
                offset_ms = tone.offset.as_millis() as u64,
                "Tone scheduled"
            );
        }
        info!(?cue, looping = cue.repeat_interval().is_some(), "Alert cue playing");

        Ok(())
    }

    fn stop(&mut self) {
        if let Some(cue) = self.looping.take() {
            info!(?cue, "Alert cue stopped");
        }
    }

    fn is_playing(&self) -> bool {
        self.looping.is_some()
    }
}
