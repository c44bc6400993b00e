//! The monitoring state simulator.
//!
//! [`MonitoringSimulator`] is the single owner of rooms, alerts, detection
//! configuration and the sensor snapshot. Every mutation goes through one of
//! its methods, each of which is a short, atomic transition:
//!
//! - [`generation_tick`](MonitoringSimulator::generation_tick) /
//!   [`generate_alert`](MonitoringSimulator::generate_alert): random alerts
//! - [`trigger_event`](MonitoringSimulator::trigger_event): operator-initiated alerts
//! - [`acknowledge_alert`](MonitoringSimulator::acknowledge_alert): resolution
//! - [`drift_sensor_data`](MonitoringSimulator::drift_sensor_data) and
//!   [`drift_room_metrics`](MonitoringSimulator::drift_room_metrics): ambient noise
//! - [`escalate_overdue`](MonitoringSimulator::escalate_overdue): escalation policy
//!
//! # Invariants
//!
//! After every operation, for each room:
//!
//! - `active_alerts` equals the number of unacknowledged alerts for that room
//!   in the alert list
//! - `status` is derived from those alerts via [`RoomStatus::from_severities`],
//!   unless the room is offline
//!
//! Randomness comes from the injected `R: Rng` and time from the `now`
//! argument, so every transition is reproducible under a seeded generator.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::audio::{AlertCue, AudioSink, ToneAudio};
use crate::config::{DEFAULT_SELECTED_ROOM, DetectionConfig};
use crate::error::SimulatorError;
use crate::model::{
    Alert, AlertSeverity, AlertType, EventKind, Position, Room, RoomMetrics, RoomStatus,
    SensorData, Snapshot, SystemStats,
};

/// Maximum number of alerts kept in memory; older ones are dropped.
pub const MAX_ALERTS: usize = 50;

/// Chance that a generation tick attempts to create an alert.
pub const GENERATION_PROBABILITY: f64 = 0.08;

/// Confidence band for operator-triggered events.
const TRIGGER_CONFIDENCE_MIN: f64 = 0.85;
const TRIGGER_CONFIDENCE_MAX: f64 = 0.97;

const UPTIME: &str = "99.7%";

/// The simulator as run by the server.
pub type Monitor = MonitoringSimulator<StdRng, ToneAudio>;

/// Handle shared between the scheduler and the HTTP layer.
pub type SharedMonitor = Arc<Mutex<Monitor>>;

/// The fixed room list every session starts from.
pub fn seed_rooms(now: DateTime<Utc>) -> Vec<Room> {
    let room = |id: &str, name: &str, patient: &str, fps: u32, latency_ms: u32| Room {
        id: id.to_string(),
        name: name.to_string(),
        status: RoomStatus::Normal,
        patient_id: Some(patient.to_string()),
        last_activity: now,
        active_alerts: 0,
        metrics: RoomMetrics {
            fps,
            latency_ms,
            privacy_mode: true,
        },
    };

    vec![
        room("BED-101", "Bed 101", "John D.", 12, 45),
        room("BED-102", "Bed 102", "Sarah M.", 11, 52),
        room("BED-103", "Bed 103", "Robert K.", 12, 48),
        Room {
            id: "BED-104".to_string(),
            name: "Bed 104".to_string(),
            status: RoomStatus::Offline,
            patient_id: None,
            last_activity: now - chrono::Duration::hours(1),
            active_alerts: 0,
            metrics: RoomMetrics {
                fps: 0,
                latency_ms: 0,
                privacy_mode: true,
            },
        },
    ]
}

/// In-memory monitoring state plus the commands that mutate it.
pub struct MonitoringSimulator<R, A> {
    config: DetectionConfig,
    rooms: Vec<Room>,
    /// Newest first.
    alerts: VecDeque<Alert>,
    selected_room: String,
    paused: bool,
    muted: bool,
    /// When each room last received a generated alert (cooldown clock).
    last_alert_at: HashMap<String, DateTime<Utc>>,
    sensor: SensorData,
    next_sequence: u64,
    rng: R,
    audio: A,
}

impl<R: Rng, A: AudioSink> MonitoringSimulator<R, A> {
    /// Create a simulator with the seeded rooms and default configuration.
    pub fn new(rng: R, audio: A, now: DateTime<Utc>) -> Self {
        Self {
            config: DetectionConfig::default(),
            rooms: seed_rooms(now),
            alerts: VecDeque::with_capacity(MAX_ALERTS + 1),
            selected_room: DEFAULT_SELECTED_ROOM.to_string(),
            paused: false,
            muted: false,
            last_alert_at: HashMap::new(),
            sensor: SensorData::default(),
            next_sequence: 0,
            rng,
            audio,
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == room_id)
    }

    /// Alerts, newest first.
    pub fn alerts(&self) -> &VecDeque<Alert> {
        &self.alerts
    }

    pub fn alert(&self, alert_id: &str) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == alert_id)
    }

    pub fn sensor(&self) -> &SensorData {
        &self.sensor
    }

    pub fn selected_room(&self) -> &str {
        &self.selected_room
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    /// Statistics derived from the current rooms and alerts.
    pub fn stats(&self) -> SystemStats {
        let online: Vec<&Room> = self.rooms.iter().filter(|r| !r.is_offline()).collect();
        let divisor = online.len().max(1) as f64;

        let fps_total: u32 = online.iter().map(|r| r.metrics.fps).sum();
        let latency_total: u32 = online.iter().map(|r| r.metrics.latency_ms).sum();

        SystemStats {
            total_rooms: online.len(),
            active_alerts: self.alerts.iter().filter(|a| !a.acknowledged).count(),
            avg_fps: (f64::from(fps_total) / divisor).round() as u32,
            avg_latency_ms: (f64::from(latency_total) / divisor).round() as u32,
            uptime: UPTIME.to_string(),
            privacy_compliant: true,
        }
    }

    /// Most recent unacknowledged alert of the selected room.
    pub fn current_alert(&self) -> Option<&Alert> {
        self.alerts
            .iter()
            .find(|a| a.room_id == self.selected_room && !a.acknowledged)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            rooms: self.rooms.clone(),
            alerts: self.alerts.iter().cloned().collect(),
            stats: self.stats(),
            sensor: self.sensor.clone(),
            selected_room: self.selected_room.clone(),
            paused: self.paused,
            muted: self.muted,
            config: self.config.clone(),
            current_alert: self.current_alert().cloned(),
        }
    }

    /// Replace the detection configuration after validating it.
    pub fn update_config(&mut self, config: DetectionConfig) -> Result<(), SimulatorError> {
        config.validate()?;
        info!(
            fall = config.fall_detection.enabled,
            risky_behavior = config.risky_behavior.enabled,
            distress = config.distress_detection.enabled,
            cooldown_seconds = config.alerting.cooldown_seconds,
            sound = config.alerting.sound_enabled,
            "Detection config updated"
        );
        self.config = config;
        Ok(())
    }

    /// Change which room the sensor snapshot and manual triggers refer to.
    pub fn select_room(&mut self, room_id: &str) -> Result<(), SimulatorError> {
        if self.room(room_id).is_none() {
            return Err(SimulatorError::UnknownRoom(room_id.to_string()));
        }
        self.selected_room = room_id.to_string();
        debug!(room_id, "Room selected");
        Ok(())
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            info!(paused, "Simulation pause toggled");
        }
        self.paused = paused;
    }

    /// Flip the mute flag, silencing any sounding cue when muting.
    ///
    /// Returns the new mute state.
    pub fn toggle_mute(&mut self) -> bool {
        if !self.muted {
            self.audio.stop();
        }
        self.muted = !self.muted;
        info!(muted = self.muted, "Mute toggled");
        self.muted
    }

    /// One tick of the generation timer: attempt generation with
    /// [`GENERATION_PROBABILITY`].
    pub fn generation_tick(&mut self, now: DateTime<Utc>) -> Option<Alert> {
        if self.paused || !self.rng.gen_bool(GENERATION_PROBABILITY) {
            return None;
        }
        self.generate_alert(now)
    }

    /// Create a random alert for a random online room.
    ///
    /// Returns `None` (and changes nothing) when paused, when no room is
    /// online, when the chosen room is cooling down, or when every detector
    /// is disabled.
    pub fn generate_alert(&mut self, now: DateTime<Utc>) -> Option<Alert> {
        if self.paused {
            return None;
        }

        let online: Vec<&str> = self
            .rooms
            .iter()
            .filter(|r| !r.is_offline())
            .map(|r| r.id.as_str())
            .collect();
        let room_id = online.choose(&mut self.rng)?.to_string();

        if let Some(last) = self.last_alert_at.get(&room_id) {
            if now - *last < self.config.cooldown() {
                debug!(room_id = %room_id, "Room in cooldown, skipping alert");
                return None;
            }
        }

        let detectors = self.config.enabled_detectors();
        let kind = *detectors.choose(&mut self.rng)?;

        let threshold = self.config.confidence_threshold(kind);
        let confidence = self.rng.gen_range(threshold..=1.0);
        let severity = *kind.generated_severities().choose(&mut self.rng)?;
        let message = *kind.messages().choose(&mut self.rng)?;

        let alert = self.new_alert(&room_id, kind, severity, message, confidence, now);
        self.push_alert(alert.clone());
        self.last_alert_at.insert(room_id.clone(), now);
        self.reconcile_room(&room_id, Some(now));

        info!(
            alert_id = %alert.id,
            room_id = %room_id,
            kind = ?kind,
            severity = severity.label(),
            confidence,
            "Alert generated"
        );

        self.play_cue(AlertCue::for_severity(severity));

        Some(alert)
    }

    /// Create an alert for the selected room on operator request.
    ///
    /// Ignores cooldown and probability. Returns `None` if the selected room
    /// is missing or offline.
    pub fn trigger_event(&mut self, kind: EventKind, now: DateTime<Utc>) -> Option<Alert> {
        let Some(room) = self.room(&self.selected_room) else {
            debug!(room_id = %self.selected_room, "Selected room missing, trigger ignored");
            return None;
        };
        if room.is_offline() {
            debug!(room_id = %room.id, "Selected room offline, trigger ignored");
            return None;
        }
        let room_id = room.id.clone();

        let severity = kind.manual_severity();
        let message = *kind.messages().choose(&mut self.rng)?;
        let confidence = self
            .rng
            .gen_range(TRIGGER_CONFIDENCE_MIN..TRIGGER_CONFIDENCE_MAX);

        let alert = self.new_alert(&room_id, kind, severity, message, confidence, now);
        self.push_alert(alert.clone());
        self.reconcile_room(&room_id, Some(now));

        let (movement, heart_rate, position) = match kind {
            EventKind::Fall => (0.9, 120, Position::Fallen),
            EventKind::RiskyBehavior => (0.7, 90, Position::Leaving),
            EventKind::Distress => (0.5, 100, Position::Lying),
        };
        self.sensor.movement = movement;
        self.sensor.heart_rate = heart_rate;
        self.sensor.position = position;

        info!(
            alert_id = %alert.id,
            room_id = %room_id,
            kind = ?kind,
            severity = severity.label(),
            "Event triggered"
        );

        if severity >= AlertSeverity::High {
            self.play_cue(AlertCue::for_severity(severity));
        }

        Some(alert)
    }

    /// Mark an alert acknowledged and re-derive its room.
    ///
    /// Returns `false` without touching state if the alert is unknown or
    /// already acknowledged.
    pub fn acknowledge_alert(&mut self, alert_id: &str) -> bool {
        let Some(alert) = self.alerts.iter_mut().find(|a| a.id == alert_id) else {
            debug!(alert_id, "Unknown alert, acknowledgment ignored");
            return false;
        };
        if alert.acknowledged {
            return false;
        }

        alert.acknowledged = true;
        let room_id = alert.room_id.clone();
        self.reconcile_room(&room_id, None);

        self.audio.stop();

        self.sensor = SensorData {
            movement: self.rng.gen_range(0.0..0.2),
            heart_rate: self.rng.gen_range(70..80),
            breathing_rate: self.rng.gen_range(14..18),
            position: Position::Lying,
        };

        info!(alert_id, room_id = %room_id, "Alert acknowledged");
        true
    }

    /// Raise overdue unacknowledged alerts by one severity level.
    ///
    /// Each alert is escalated at most once. Returns the number of alerts
    /// escalated.
    pub fn escalate_overdue(&mut self, now: DateTime<Utc>) -> usize {
        if self.paused || !self.config.alerting.escalation_enabled {
            return 0;
        }

        let delay = self.config.escalation_delay();
        let mut rooms_touched: Vec<String> = Vec::new();
        let mut loudest: Option<AlertSeverity> = None;

        for alert in self.alerts.iter_mut() {
            if alert.acknowledged || alert.is_escalated() || now - alert.timestamp < delay {
                continue;
            }
            let Some(next) = alert.severity.escalated() else {
                continue;
            };

            let metadata = alert.metadata.get_or_insert_with(serde_json::Map::new);
            metadata.insert("escalated".to_string(), serde_json::Value::Bool(true));
            metadata.insert(
                "escalated_from".to_string(),
                serde_json::Value::String(alert.severity.label().to_string()),
            );

            info!(
                alert_id = %alert.id,
                room_id = %alert.room_id,
                from = alert.severity.label(),
                to = next.label(),
                "Alert escalated"
            );

            alert.severity = next;
            rooms_touched.push(alert.room_id.clone());
            loudest = loudest.max(Some(next));
        }

        let escalated = rooms_touched.len();

        rooms_touched.sort();
        rooms_touched.dedup();
        for room_id in &rooms_touched {
            self.reconcile_room(room_id, None);
        }

        if let Some(severity) = loudest.filter(|s| *s >= AlertSeverity::High) {
            self.play_cue(AlertCue::for_severity(severity));
        }

        escalated
    }

    /// Perturb the sensor snapshot of the selected room.
    ///
    /// Rooms with active alerts drift toward agitated values and keep their
    /// position; calm rooms drift toward baseline and settle to lying.
    pub fn drift_sensor_data(&mut self) {
        if self.paused {
            return;
        }
        let has_alert = match self.room(&self.selected_room) {
            Some(room) if !room.is_offline() => room.active_alerts > 0,
            _ => return,
        };

        let prev = self.sensor.clone();
        let u_movement: f64 = self.rng.gen_range(0.0..1.0);
        let u_heart: f64 = self.rng.gen_range(0.0..1.0);
        let u_breathing: f64 = self.rng.gen_range(0.0..1.0);

        let (movement, heart_rate, position) = if has_alert {
            (
                (prev.movement + (u_movement - 0.3) * 0.2).clamp(0.0, 1.0),
                step(prev.heart_rate, (u_heart - 0.3) * 8.0, 60, 140),
                prev.position,
            )
        } else {
            (
                (prev.movement + (u_movement - 0.5) * 0.1).clamp(0.0, 0.3),
                step(prev.heart_rate, (u_heart - 0.5) * 3.0, 65, 85),
                Position::Lying,
            )
        };

        self.sensor = SensorData {
            movement,
            heart_rate,
            breathing_rate: step(prev.breathing_rate, (u_breathing - 0.5) * 2.0, 12, 25),
            position,
        };
    }

    /// Randomize fps/latency of every online room.
    pub fn drift_room_metrics(&mut self) {
        for room in self.rooms.iter_mut().filter(|r| !r.is_offline()) {
            room.metrics.fps = self.rng.gen_range(10..15);
            room.metrics.latency_ms = self.rng.gen_range(40..60);
        }
    }

    fn new_alert(
        &mut self,
        room_id: &str,
        kind: EventKind,
        severity: AlertSeverity,
        message: &str,
        confidence: f64,
        now: DateTime<Utc>,
    ) -> Alert {
        let id = format!("ALT-{}-{}", now.timestamp_millis(), self.next_sequence);
        self.next_sequence += 1;

        Alert {
            id,
            timestamp: now,
            room_id: room_id.to_string(),
            alert_type: AlertType::from(kind),
            severity,
            message: message.to_string(),
            confidence,
            acknowledged: false,
            metadata: None,
        }
    }

    /// Prepend an alert, dropping the oldest beyond [`MAX_ALERTS`].
    fn push_alert(&mut self, alert: Alert) {
        self.alerts.push_front(alert);

        while self.alerts.len() > MAX_ALERTS {
            if let Some(dropped) = self.alerts.pop_back() {
                if !dropped.acknowledged {
                    self.reconcile_room(&dropped.room_id, None);
                }
            }
        }
    }

    /// Recompute a room's active count and status from the alert list.
    fn reconcile_room(&mut self, room_id: &str, touched_at: Option<DateTime<Utc>>) {
        let open: Vec<AlertSeverity> = self
            .alerts
            .iter()
            .filter(|a| a.room_id == room_id && !a.acknowledged)
            .map(|a| a.severity)
            .collect();

        if let Some(room) = self.rooms.iter_mut().find(|r| r.id == room_id) {
            room.active_alerts = open.len() as u32;
            if !room.is_offline() {
                room.status = RoomStatus::from_severities(open);
            }
            if let Some(now) = touched_at {
                room.last_activity = now;
            }
        }
    }

    fn play_cue(&mut self, cue: AlertCue) {
        if self.muted || !self.config.alerting.sound_enabled {
            return;
        }
        if let Err(e) = self.audio.play(cue) {
            warn!(?cue, error = %e, "Failed to play alert cue");
        }
    }
}

/// Add `floor(delta)` to `value` and clamp to `[min, max]`.
fn step(value: u32, delta: f64, min: u32, max: u32) -> u32 {
    let next = i64::from(value) + delta.floor() as i64;
    next.clamp(i64::from(min), i64::from(max)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AudioError;
    use rand::SeedableRng;

    #[derive(Debug, Default)]
    struct RecordingAudio {
        played: Vec<AlertCue>,
        stops: usize,
        playing: bool,
    }

    impl AudioSink for RecordingAudio {
        fn play(&mut self, cue: AlertCue) -> Result<(), AudioError> {
            self.played.push(cue);
            if cue.repeat_interval().is_some() {
                self.playing = true;
            }
            Ok(())
        }

        fn stop(&mut self) {
            self.stops += 1;
            self.playing = false;
        }

        fn is_playing(&self) -> bool {
            self.playing
        }
    }

    type TestSimulator = MonitoringSimulator<StdRng, RecordingAudio>;

    fn simulator(seed: u64) -> (TestSimulator, DateTime<Utc>) {
        let now = Utc::now();
        let sim = MonitoringSimulator::new(StdRng::seed_from_u64(seed), RecordingAudio::default(), now);
        (sim, now)
    }

    fn assert_invariants(sim: &TestSimulator) {
        assert!(sim.alerts().len() <= MAX_ALERTS);

        for room in sim.rooms() {
            let open: Vec<AlertSeverity> = sim
                .alerts()
                .iter()
                .filter(|a| a.room_id == room.id && !a.acknowledged)
                .map(|a| a.severity)
                .collect();

            assert_eq!(room.active_alerts as usize, open.len(), "room {}", room.id);
            if !room.is_offline() {
                assert_eq!(room.status, RoomStatus::from_severities(open), "room {}", room.id);
            }
        }
    }

    fn with_cooldown(sim: &mut TestSimulator, seconds: u64) {
        let mut config = sim.config().clone();
        config.alerting.cooldown_seconds = seconds;
        sim.update_config(config).unwrap();
    }

    #[test]
    fn test_seeded_state() {
        let (sim, _) = simulator(1);

        assert_eq!(sim.rooms().len(), 4);
        assert_eq!(sim.selected_room(), "BED-101");
        assert!(sim.room("BED-104").unwrap().is_offline());

        let stats = sim.stats();
        assert_eq!(stats.total_rooms, 3);
        assert_eq!(stats.active_alerts, 0);
        assert_eq!(stats.avg_fps, 12); // (12 + 11 + 12) / 3 = 11.67
        assert_eq!(stats.avg_latency_ms, 48); // (45 + 52 + 48) / 3 = 48.33
        assert_eq!(stats.uptime, "99.7%");
        assert!(stats.privacy_compliant);
    }

    #[test]
    fn test_trigger_fall_on_selected_room() {
        let (mut sim, now) = simulator(2);

        let alert = sim.trigger_event(EventKind::Fall, now).unwrap();

        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!(alert.alert_type, AlertType::Fall);
        assert_eq!(alert.room_id, "BED-101");
        assert!((0.85..0.97).contains(&alert.confidence));

        let room = sim.room("BED-101").unwrap();
        assert_eq!(room.status, RoomStatus::Critical);
        assert_eq!(room.active_alerts, 1);

        assert_eq!(sim.sensor().position, Position::Fallen);
        assert_eq!(sim.sensor().heart_rate, 120);
        assert_eq!(sim.audio().played, vec![AlertCue::Emergency]);
        assert_eq!(sim.current_alert().map(|a| a.id.clone()), Some(alert.id));
        assert_invariants(&sim);
    }

    #[test]
    fn test_acknowledge_resets_room_and_sensor() {
        let (mut sim, now) = simulator(3);
        let alert = sim.trigger_event(EventKind::Fall, now).unwrap();

        assert!(sim.acknowledge_alert(&alert.id));

        let room = sim.room("BED-101").unwrap();
        assert_eq!(room.status, RoomStatus::Normal);
        assert_eq!(room.active_alerts, 0);

        let sensor = sim.sensor();
        assert!(sensor.movement < 0.3);
        assert!((65..=85).contains(&sensor.heart_rate));
        assert_eq!(sensor.position, Position::Lying);

        assert!(!sim.audio().is_playing());
        assert!(sim.alert(&alert.id).unwrap().acknowledged);
        assert!(sim.current_alert().is_none());
        assert_invariants(&sim);
    }

    #[test]
    fn test_acknowledge_critical_leaves_high_as_warning() {
        let (mut sim, now) = simulator(4);

        sim.trigger_event(EventKind::RiskyBehavior, now).unwrap();
        let critical = sim.trigger_event(EventKind::Fall, now).unwrap();
        assert_eq!(sim.room("BED-101").unwrap().status, RoomStatus::Critical);

        sim.acknowledge_alert(&critical.id);

        let room = sim.room("BED-101").unwrap();
        assert_eq!(room.status, RoomStatus::Warning);
        assert_eq!(room.active_alerts, 1);
        assert_invariants(&sim);
    }

    #[test]
    fn test_acknowledge_twice_is_idempotent() {
        let (mut sim, now) = simulator(5);
        let alert = sim.trigger_event(EventKind::Distress, now).unwrap();

        assert!(sim.acknowledge_alert(&alert.id));
        let before = serde_json::to_value(sim.snapshot()).unwrap();

        assert!(!sim.acknowledge_alert(&alert.id));
        let after = serde_json::to_value(sim.snapshot()).unwrap();

        assert_eq!(before, after);
    }

    #[test]
    fn test_acknowledge_unknown_is_noop() {
        let (mut sim, now) = simulator(6);
        sim.trigger_event(EventKind::Fall, now).unwrap();
        let before = serde_json::to_value(sim.snapshot()).unwrap();

        assert!(!sim.acknowledge_alert("ALT-does-not-exist"));

        assert_eq!(before, serde_json::to_value(sim.snapshot()).unwrap());
        assert_eq!(sim.audio().stops, 0);
    }

    #[test]
    fn test_trigger_on_offline_room_is_noop() {
        let (mut sim, now) = simulator(7);
        sim.select_room("BED-104").unwrap();

        assert!(sim.trigger_event(EventKind::Fall, now).is_none());
        assert!(sim.alerts().is_empty());
        assert!(sim.audio().played.is_empty());
        assert_eq!(sim.room("BED-104").unwrap().status, RoomStatus::Offline);
    }

    #[test]
    fn test_distress_trigger_keeps_status_normal_and_is_silent() {
        let (mut sim, now) = simulator(8);

        let alert = sim.trigger_event(EventKind::Distress, now).unwrap();

        assert_eq!(alert.severity, AlertSeverity::Medium);
        let room = sim.room("BED-101").unwrap();
        assert_eq!(room.status, RoomStatus::Normal);
        assert_eq!(room.active_alerts, 1);
        assert!(sim.audio().played.is_empty());
    }

    #[test]
    fn test_generation_respects_config() {
        let (mut sim, now) = simulator(9);
        with_cooldown(&mut sim, 0);

        for i in 0..30 {
            let at = now + chrono::Duration::seconds(i);
            let alert = sim.generate_alert(at).unwrap();
            let kind = match alert.alert_type {
                AlertType::Fall => EventKind::Fall,
                AlertType::RiskyBehavior => EventKind::RiskyBehavior,
                AlertType::Distress => EventKind::Distress,
                AlertType::System => panic!("generator produced a system alert"),
            };

            assert_ne!(alert.room_id, "BED-104");
            assert!(kind.generated_severities().contains(&alert.severity));
            assert!(kind.messages().contains(&alert.message.as_str()));
            assert!(alert.confidence >= sim.config().confidence_threshold(kind));
            assert!(alert.confidence <= 1.0);
            assert_eq!(
                sim.audio().played.last(),
                Some(&AlertCue::for_severity(alert.severity))
            );
            assert_invariants(&sim);
        }

        assert_eq!(sim.audio().played.len(), 30);
    }

    #[test]
    fn test_generated_cues_follow_severity() {
        let now = Utc::now();
        let mut warnings = 0;
        let mut soft = 0;

        for seed in 0..60 {
            let mut sim: TestSimulator =
                MonitoringSimulator::new(StdRng::seed_from_u64(seed), RecordingAudio::default(), now);
            let alert = sim.generate_alert(now).unwrap();
            let room = sim.room(&alert.room_id).unwrap();

            match alert.severity {
                AlertSeverity::Critical => {
                    assert_eq!(room.status, RoomStatus::Critical);
                    assert_eq!(sim.audio().played, vec![AlertCue::Emergency]);
                }
                AlertSeverity::High => {
                    assert_eq!(room.status, RoomStatus::Warning);
                    assert_eq!(sim.audio().played, vec![AlertCue::Warning]);
                    warnings += 1;
                }
                AlertSeverity::Medium | AlertSeverity::Low => {
                    assert_eq!(room.status, RoomStatus::Normal);
                    assert_eq!(sim.audio().played, vec![AlertCue::Soft]);
                    soft += 1;
                }
            }
            assert_eq!(room.active_alerts, 1);
        }

        assert!(warnings > 0);
        assert!(soft > 0);
    }

    #[test]
    fn test_generation_with_all_detectors_disabled() {
        let (mut sim, now) = simulator(10);
        let mut config = sim.config().clone();
        config.fall_detection.enabled = false;
        config.risky_behavior.enabled = false;
        config.distress_detection.enabled = false;
        config.alerting.cooldown_seconds = 0;
        sim.update_config(config).unwrap();

        for i in 0..200 {
            assert!(sim.generate_alert(now + chrono::Duration::seconds(i)).is_none());
        }
        assert!(sim.alerts().is_empty());
    }

    #[test]
    fn test_generation_honors_cooldown() {
        let (mut sim, now) = simulator(11);

        // At a fixed instant each online room can be alerted at most once
        for _ in 0..200 {
            sim.generate_alert(now);
        }
        assert_eq!(sim.alerts().len(), 3);
        let rooms_before: Vec<Room> = sim.rooms().to_vec();

        let within = now + chrono::Duration::seconds(29);
        for _ in 0..200 {
            assert!(sim.generate_alert(within).is_none());
        }
        assert_eq!(sim.alerts().len(), 3);
        assert_eq!(sim.rooms(), rooms_before.as_slice());

        let after = now + chrono::Duration::seconds(30);
        assert!(sim.generate_alert(after).is_some());
        assert_invariants(&sim);
    }

    #[test]
    fn test_manual_trigger_ignores_cooldown() {
        let (mut sim, now) = simulator(12);

        for _ in 0..5 {
            assert!(sim.trigger_event(EventKind::RiskyBehavior, now).is_some());
        }
        assert_eq!(sim.room("BED-101").unwrap().active_alerts, 5);
    }

    #[test]
    fn test_manual_trigger_does_not_start_cooldown() {
        let (mut sim, now) = simulator(28);
        let manual = sim.trigger_event(EventKind::Fall, now).unwrap();

        for _ in 0..200 {
            sim.generate_alert(now);
        }

        let generated_for_selected = sim
            .alerts()
            .iter()
            .filter(|a| a.room_id == "BED-101" && a.id != manual.id)
            .count();
        assert_eq!(generated_for_selected, 1);
        assert_eq!(sim.room("BED-101").unwrap().active_alerts, 2);
        assert_invariants(&sim);
    }

    #[test]
    fn test_huge_cooldown_and_escalation_delay() {
        let (mut sim, now) = simulator(29);
        let mut config = sim.config().clone();
        config.alerting.cooldown_seconds = 10_000_000_000_000_000;
        config.alerting.escalation_delay_seconds = 10_000_000_000_000_000;
        sim.update_config(config).unwrap();

        for _ in 0..200 {
            sim.generate_alert(now);
        }
        // One alert per online room, the rest are cooling down
        assert_eq!(sim.alerts().len(), 3);

        assert_eq!(sim.escalate_overdue(now + chrono::Duration::days(365)), 0);
        assert_invariants(&sim);
    }

    #[test]
    fn test_alert_list_capped_at_fifty() {
        let (mut sim, now) = simulator(13);
        with_cooldown(&mut sim, 0);

        let first = sim.generate_alert(now).unwrap();
        for i in 1..120 {
            sim.generate_alert(now + chrono::Duration::seconds(i)).unwrap();
            assert_invariants(&sim);
        }

        assert_eq!(sim.alerts().len(), MAX_ALERTS);
        assert!(sim.alert(&first.id).is_none());

        // Newest first
        let timestamps: Vec<_> = sim.alerts().iter().map(|a| a.timestamp).collect();
        assert!(timestamps.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(sim.stats().active_alerts, MAX_ALERTS);
    }

    #[test]
    fn test_alert_ids_are_unique() {
        let (mut sim, now) = simulator(14);

        let a = sim.trigger_event(EventKind::Fall, now).unwrap();
        let b = sim.trigger_event(EventKind::Fall, now).unwrap();

        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("ALT-"));
    }

    #[test]
    fn test_generation_tick_probability() {
        let (mut sim, now) = simulator(15);
        with_cooldown(&mut sim, 0);

        let mut generated = 0;
        for i in 0..1000 {
            if sim.generation_tick(now + chrono::Duration::seconds(i)).is_some() {
                generated += 1;
            }
        }

        // Expected about 80
        assert!(generated > 30, "generated {generated}");
        assert!(generated < 160, "generated {generated}");
    }

    #[test]
    fn test_paused_blocks_generation_and_drift() {
        let (mut sim, now) = simulator(16);
        with_cooldown(&mut sim, 0);
        sim.set_paused(true);

        for i in 0..100 {
            assert!(sim.generate_alert(now + chrono::Duration::seconds(i)).is_none());
            assert!(sim.generation_tick(now + chrono::Duration::seconds(i)).is_none());
        }

        let sensor = sim.sensor().clone();
        for _ in 0..20 {
            sim.drift_sensor_data();
        }
        assert_eq!(sim.sensor(), &sensor);

        sim.set_paused(false);
        assert!(sim.generate_alert(now).is_some());
    }

    #[test]
    fn test_mute_stops_siren_and_silences_future_cues() {
        let (mut sim, now) = simulator(17);

        sim.trigger_event(EventKind::Fall, now).unwrap();
        assert!(sim.audio().is_playing());

        assert!(sim.toggle_mute());
        assert!(!sim.audio().is_playing());

        sim.trigger_event(EventKind::Fall, now).unwrap();
        assert_eq!(sim.audio().played.len(), 1);

        assert!(!sim.toggle_mute());
        sim.trigger_event(EventKind::RiskyBehavior, now).unwrap();
        assert_eq!(sim.audio().played.last(), Some(&AlertCue::Warning));
    }

    #[test]
    fn test_sound_disabled_plays_nothing() {
        let (mut sim, now) = simulator(18);
        let mut config = sim.config().clone();
        config.alerting.sound_enabled = false;
        config.alerting.cooldown_seconds = 0;
        sim.update_config(config).unwrap();

        sim.trigger_event(EventKind::Fall, now).unwrap();
        for i in 0..10 {
            sim.generate_alert(now + chrono::Duration::seconds(i));
        }

        assert!(sim.audio().played.is_empty());
    }

    #[test]
    fn test_audio_failure_does_not_affect_state() {
        let now = Utc::now();
        let mut sim = MonitoringSimulator::new(
            StdRng::seed_from_u64(19),
            ToneAudio::unavailable("denied"),
            now,
        );

        let alert = sim.trigger_event(EventKind::Fall, now).unwrap();

        assert_eq!(sim.room("BED-101").unwrap().status, RoomStatus::Critical);
        assert!(sim.acknowledge_alert(&alert.id));
        assert_eq!(sim.room("BED-101").unwrap().status, RoomStatus::Normal);
    }

    #[test]
    fn test_sensor_drift_agitated_bounds() {
        let (mut sim, now) = simulator(20);
        sim.trigger_event(EventKind::Fall, now).unwrap();

        for _ in 0..500 {
            sim.drift_sensor_data();
            let s = sim.sensor();
            assert!((0.0..=1.0).contains(&s.movement));
            assert!((60..=140).contains(&s.heart_rate));
            assert!((12..=25).contains(&s.breathing_rate));
            assert_eq!(s.position, Position::Fallen);
        }
    }

    #[test]
    fn test_sensor_drift_calm_bounds() {
        let (mut sim, _) = simulator(21);

        for _ in 0..500 {
            sim.drift_sensor_data();
            let s = sim.sensor();
            assert!((0.0..=0.3).contains(&s.movement));
            assert!((65..=85).contains(&s.heart_rate));
            assert!((12..=25).contains(&s.breathing_rate));
            assert_eq!(s.position, Position::Lying);
        }
    }

    #[test]
    fn test_sensor_drift_skips_offline_selection() {
        let (mut sim, _) = simulator(22);
        sim.select_room("BED-104").unwrap();
        let sensor = sim.sensor().clone();

        for _ in 0..20 {
            sim.drift_sensor_data();
        }
        assert_eq!(sim.sensor(), &sensor);
    }

    #[test]
    fn test_room_metrics_drift() {
        let (mut sim, _) = simulator(23);

        for _ in 0..100 {
            sim.drift_room_metrics();
            for room in sim.rooms() {
                if room.is_offline() {
                    assert_eq!(room.metrics.fps, 0);
                    assert_eq!(room.metrics.latency_ms, 0);
                } else {
                    assert!((10..=14).contains(&room.metrics.fps));
                    assert!((40..=59).contains(&room.metrics.latency_ms));
                }
            }
        }
    }

    #[test]
    fn test_escalation_raises_overdue_alert_once() {
        let (mut sim, now) = simulator(24);
        let alert = sim.trigger_event(EventKind::RiskyBehavior, now).unwrap();
        assert_eq!(sim.room("BED-101").unwrap().status, RoomStatus::Warning);

        assert_eq!(sim.escalate_overdue(now + chrono::Duration::seconds(59)), 0);
        assert_eq!(sim.escalate_overdue(now + chrono::Duration::seconds(60)), 1);

        let escalated = sim.alert(&alert.id).unwrap();
        assert_eq!(escalated.severity, AlertSeverity::Critical);
        assert!(escalated.is_escalated());
        assert_eq!(
            escalated.metadata.as_ref().unwrap()["escalated_from"],
            serde_json::json!("high")
        );
        assert_eq!(sim.room("BED-101").unwrap().status, RoomStatus::Critical);
        assert_eq!(sim.audio().played.last(), Some(&AlertCue::Emergency));

        assert_eq!(sim.escalate_overdue(now + chrono::Duration::seconds(600)), 0);
        assert_invariants(&sim);
    }

    #[test]
    fn test_escalation_skips_acknowledged_and_disabled() {
        let (mut sim, now) = simulator(25);
        let acked = sim.trigger_event(EventKind::Distress, now).unwrap();
        sim.acknowledge_alert(&acked.id);

        assert_eq!(sim.escalate_overdue(now + chrono::Duration::seconds(120)), 0);

        sim.trigger_event(EventKind::Distress, now).unwrap();
        let mut config = sim.config().clone();
        config.alerting.escalation_enabled = false;
        sim.update_config(config).unwrap();

        assert_eq!(sim.escalate_overdue(now + chrono::Duration::seconds(120)), 0);
    }

    #[test]
    fn test_select_unknown_room_rejected() {
        let (mut sim, _) = simulator(26);

        let err = sim.select_room("BED-999").unwrap_err();
        assert_eq!(err, SimulatorError::UnknownRoom("BED-999".to_string()));
        assert_eq!(sim.selected_room(), "BED-101");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (mut sim, _) = simulator(27);
        let mut config = sim.config().clone();
        config.fall_detection.confidence_threshold = -0.1;

        assert!(matches!(
            sim.update_config(config),
            Err(SimulatorError::InvalidConfig(_))
        ));
        assert_eq!(sim.config(), &DetectionConfig::default());
    }

    #[test]
    fn test_step_clamps() {
        assert_eq!(step(140, 5.6, 60, 140), 140);
        assert_eq!(step(60, -2.4, 60, 140), 60);
        assert_eq!(step(72, -0.5, 65, 85), 71);
        assert_eq!(step(72, 0.9, 65, 85), 72);
    }
}
