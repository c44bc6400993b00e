//! Data models for Wardwatch.
//!
//! # Privacy
//!
//! Rooms carry only a display name and an optional short patient label
//! (e.g. "John D."). No images, pose frames, or raw sensor streams are ever
//! held by these types: detection is simulated, and the only per-patient
//! signal is the single [`SensorData`] snapshot of the selected room.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;

/// Severity of an alert.
///
/// Ordered from least to most urgent so that `max()` over a set of alerts
/// yields the one that drives room status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    /// The next severity level, or `None` if already critical.
    pub fn escalated(self) -> Option<Self> {
        match self {
            AlertSeverity::Low => Some(AlertSeverity::Medium),
            AlertSeverity::Medium => Some(AlertSeverity::High),
            AlertSeverity::High => Some(AlertSeverity::Critical),
            AlertSeverity::Critical => None,
        }
    }

    /// Lowercase label, matching the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

/// Category of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Fall,
    RiskyBehavior,
    Distress,
    /// Reserved for infrastructure alerts; never produced by the simulator.
    System,
}

/// A detector category that can raise alerts.
///
/// This is the subset of [`AlertType`] that the generator and the manual
/// trigger accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Fall,
    RiskyBehavior,
    Distress,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Fall, EventKind::RiskyBehavior, EventKind::Distress];

    /// Severity used when an operator triggers this event by hand.
    pub fn manual_severity(self) -> AlertSeverity {
        match self {
            EventKind::Fall => AlertSeverity::Critical,
            EventKind::RiskyBehavior => AlertSeverity::High,
            EventKind::Distress => AlertSeverity::Medium,
        }
    }

    /// Severities the random generator chooses from.
    pub fn generated_severities(self) -> &'static [AlertSeverity] {
        match self {
            EventKind::Fall => &[AlertSeverity::High, AlertSeverity::Critical],
            EventKind::RiskyBehavior => &[AlertSeverity::Medium, AlertSeverity::High],
            EventKind::Distress => &[AlertSeverity::Low, AlertSeverity::Medium, AlertSeverity::High],
        }
    }

    /// Human-readable messages for this event, one of which is picked at random.
    pub fn messages(self) -> &'static [&'static str] {
        match self {
            EventKind::Fall => &[
                "⚠️ Patient fall detected from bed sensor!",
                "🚨 Sudden pressure change - Patient may have fallen!",
                "❗ Bed sensor detected patient on floor",
            ],
            EventKind::RiskyBehavior => &[
                "Patient attempting to leave bed unassisted",
                "Unusual movement pattern - Patient may be agitated",
                "Edge sensors triggered - Patient at risk of falling",
            ],
            EventKind::Distress => &[
                "Elevated stress patterns detected from bed sensor",
                "Abnormal movement indicating patient distress",
                "Patient showing signs of agitation or discomfort",
            ],
        }
    }
}

impl From<EventKind> for AlertType {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Fall => AlertType::Fall,
            EventKind::RiskyBehavior => AlertType::RiskyBehavior,
            EventKind::Distress => AlertType::Distress,
        }
    }
}

/// Operational status of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// No unacknowledged high or critical alerts.
    Normal,

    /// At least one unacknowledged high alert, none critical.
    Warning,

    /// At least one unacknowledged critical alert.
    Critical,

    /// The room's feed is down. Never derived from alerts.
    Offline,
}

impl RoomStatus {
    /// Derive status from the severities of a room's unacknowledged alerts.
    ///
    /// # Rules
    ///
    /// - `critical`: any alert is critical
    /// - `warning`: any alert is high
    /// - `normal`: otherwise (low/medium alerts do not change status)
    pub fn from_severities<I>(severities: I) -> Self
    where
        I: IntoIterator<Item = AlertSeverity>,
    {
        match severities.into_iter().max() {
            Some(AlertSeverity::Critical) => RoomStatus::Critical,
            Some(AlertSeverity::High) => RoomStatus::Warning,
            _ => RoomStatus::Normal,
        }
    }
}

/// Per-room pipeline metrics. Purely cosmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomMetrics {
    pub fps: u32,
    pub latency_ms: u32,
    pub privacy_mode: bool,
}

/// A monitored bed/unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Stable key such as "BED-101".
    pub id: String,

    pub name: String,

    pub status: RoomStatus,

    /// Short patient label, absent for empty rooms.
    pub patient_id: Option<String>,

    pub last_activity: DateTime<Utc>,

    /// Number of unacknowledged alerts for this room.
    pub active_alerts: u32,

    pub metrics: RoomMetrics,
}

impl Room {
    pub fn is_offline(&self) -> bool {
        self.status == RoomStatus::Offline
    }
}

/// A detected (simulated) condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Time-based unique token, e.g. "ALT-1718000000000-7".
    pub id: String,

    pub timestamp: DateTime<Utc>,

    pub room_id: String,

    #[serde(rename = "type")]
    pub alert_type: AlertType,

    pub severity: AlertSeverity,

    pub message: String,

    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,

    pub acknowledged: bool,

    /// Free-form annotations (escalation history, for instance).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Alert {
    /// Whether the escalation sweep has already raised this alert.
    pub fn is_escalated(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("escalated"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// Patient position as reported by the bed sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Lying,
    Sitting,
    Leaving,
    Fallen,
}

/// Vitals snapshot of the currently selected room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorData {
    /// Normalized movement intensity in `[0, 1]`.
    pub movement: f64,

    /// Beats per minute.
    pub heart_rate: u32,

    /// Breaths per minute.
    pub breathing_rate: u32,

    pub position: Position,
}

impl Default for SensorData {
    fn default() -> Self {
        Self {
            movement: 0.0,
            heart_rate: 72,
            breathing_rate: 16,
            position: Position::Lying,
        }
    }
}

/// Aggregate statistics, recomputed on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    /// Rooms that are not offline.
    pub total_rooms: usize,

    /// Unacknowledged alerts across all rooms.
    pub active_alerts: usize,

    pub avg_fps: u32,

    pub avg_latency_ms: u32,

    pub uptime: String,

    pub privacy_compliant: bool,
}

/// Full view of simulator state for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub rooms: Vec<Room>,

    /// Newest first.
    pub alerts: Vec<Alert>,

    pub stats: SystemStats,

    pub sensor: SensorData,

    pub selected_room: String,

    pub paused: bool,

    pub muted: bool,

    pub config: DetectionConfig,

    /// Most recent unacknowledged alert of the selected room.
    pub current_alert: Option<Alert>,
}

/// Request body for POST /events.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerRequest {
    #[serde(rename = "type")]
    pub kind: EventKind,
}

/// Request body for POST /pause.
#[derive(Debug, Clone, Deserialize)]
pub struct PauseRequest {
    pub paused: bool,
}

/// Request body for PUT /selected-room.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectRoomRequest {
    pub room_id: String,
}

/// Pause/mute flags returned by the control endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ControlState {
    pub paused: bool,
    pub muted: bool,
    pub selected_room: String,
}

/// Response for POST /alerts/{id}/acknowledge.
#[derive(Debug, Clone, Serialize)]
pub struct AcknowledgeResponse {
    pub alert_id: String,

    /// False when the alert was unknown or already acknowledged.
    pub changed: bool,
}

/// Query parameters for GET /alerts.
#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    /// Restrict to one room.
    pub room_id: Option<String>,

    /// Only return unacknowledged alerts (default: false).
    #[serde(default)]
    pub unacknowledged: bool,
}

/// Response for GET /alerts.
#[derive(Debug, Clone, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<Alert>,
    pub count: usize,
}
