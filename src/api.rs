//! HTTP API handlers for Wardwatch.
//!
//! This is the presentation boundary: dashboards read the simulator state
//! through the `GET` endpoints and drive it through the command endpoints.
//! Every handler takes the shared lock for a single transition.
//!
//! # Privacy
//!
//! Handlers log room and alert identifiers only. Patient labels never appear
//! in logs, and no request metadata (addresses, user agents) is recorded.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::Utc;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::config::DetectionConfig;
use crate::error::SimulatorError;
use crate::model::{
    AcknowledgeResponse, AlertsQuery, AlertsResponse, ControlState, PauseRequest, Room,
    SelectRoomRequest, SensorData, Snapshot, SystemStats, TriggerRequest,
};
use crate::simulator::SharedMonitor;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub monitor: SharedMonitor,
}

/// Build the full router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/snapshot", get(get_snapshot))
        .route("/rooms", get(get_rooms))
        .route("/alerts", get(get_alerts))
        .route("/alerts/:id/acknowledge", post(acknowledge_alert))
        .route("/events", post(trigger_event))
        .route("/stats", get(get_stats))
        .route("/sensor", get(get_sensor))
        .route("/config", get(get_config).put(put_config))
        .route("/pause", post(set_paused))
        .route("/mute", post(toggle_mute))
        .route("/selected-room", put(select_room))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /snapshot - Full simulator state.
#[instrument(skip(state))]
pub async fn get_snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    let monitor = state.monitor.lock().await;
    Json(monitor.snapshot())
}

/// GET /rooms - All rooms, including offline ones.
#[instrument(skip(state))]
pub async fn get_rooms(State(state): State<AppState>) -> Json<Vec<Room>> {
    let monitor = state.monitor.lock().await;
    Json(monitor.rooms().to_vec())
}

/// GET /alerts - Alerts, newest first.
///
/// # Query Parameters
///
/// - `room_id` (optional): Only alerts for this room
/// - `unacknowledged` (optional): Only open alerts (default: false)
#[instrument(skip(state))]
pub async fn get_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Json<AlertsResponse> {
    let monitor = state.monitor.lock().await;

    let alerts: Vec<_> = monitor
        .alerts()
        .iter()
        .filter(|a| query.room_id.as_deref().is_none_or(|room| a.room_id == room))
        .filter(|a| !query.unacknowledged || !a.acknowledged)
        .cloned()
        .collect();

    Json(AlertsResponse {
        count: alerts.len(),
        alerts,
    })
}

/// GET /stats - Aggregate statistics.
#[instrument(skip(state))]
pub async fn get_stats(State(state): State<AppState>) -> Json<SystemStats> {
    let monitor = state.monitor.lock().await;
    Json(monitor.stats())
}

/// GET /sensor - Sensor snapshot of the selected room.
#[instrument(skip(state))]
pub async fn get_sensor(State(state): State<AppState>) -> Json<SensorData> {
    let monitor = state.monitor.lock().await;
    Json(monitor.sensor().clone())
}

/// GET /config - Current detection configuration.
#[instrument(skip(state))]
pub async fn get_config(State(state): State<AppState>) -> Json<DetectionConfig> {
    let monitor = state.monitor.lock().await;
    Json(monitor.config().clone())
}

/// PUT /config - Replace the detection configuration.
///
/// Returns `422 Unprocessable Entity` if any threshold is outside `[0, 1]`.
#[instrument(skip(state, config))]
pub async fn put_config(
    State(state): State<AppState>,
    Json(config): Json<DetectionConfig>,
) -> Response {
    let mut monitor = state.monitor.lock().await;

    match monitor.update_config(config) {
        Ok(()) => Json(monitor.config().clone()).into_response(),
        Err(e) => {
            warn!(error = %e, "Rejected detection config");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// POST /alerts/:id/acknowledge - Acknowledge an alert.
///
/// Unknown or already acknowledged alerts are not an error; the response
/// reports `"changed": false`.
#[instrument(skip(state))]
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<String>,
) -> Json<AcknowledgeResponse> {
    let mut monitor = state.monitor.lock().await;
    let changed = monitor.acknowledge_alert(&alert_id);

    Json(AcknowledgeResponse { alert_id, changed })
}

/// POST /events - Trigger an event on the selected room.
///
/// # Request Body
///
/// ```json
/// { "type": "fall" }
/// ```
///
/// Type can be: "fall", "risky_behavior", or "distress".
///
/// # Response
///
/// `201 Created` with the new alert, or `204 No Content` when the selected
/// room is offline.
#[instrument(skip(state))]
pub async fn trigger_event(
    State(state): State<AppState>,
    Json(request): Json<TriggerRequest>,
) -> Response {
    let mut monitor = state.monitor.lock().await;

    match monitor.trigger_event(request.kind, Utc::now()) {
        Some(alert) => (StatusCode::CREATED, Json(alert)).into_response(),
        None => {
            info!(
                room_id = %monitor.selected_room(),
                kind = ?request.kind,
                "Trigger ignored"
            );
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

/// POST /pause - Pause or resume the simulation.
#[instrument(skip(state))]
pub async fn set_paused(
    State(state): State<AppState>,
    Json(request): Json<PauseRequest>,
) -> Json<ControlState> {
    let mut monitor = state.monitor.lock().await;
    monitor.set_paused(request.paused);

    Json(control_state(&monitor))
}

/// POST /mute - Toggle audio cues.
#[instrument(skip(state))]
pub async fn toggle_mute(State(state): State<AppState>) -> Json<ControlState> {
    let mut monitor = state.monitor.lock().await;
    monitor.toggle_mute();

    Json(control_state(&monitor))
}

/// PUT /selected-room - Change the selected room.
///
/// Returns `404 Not Found` for a room that does not exist.
#[instrument(skip(state))]
pub async fn select_room(
    State(state): State<AppState>,
    Json(request): Json<SelectRoomRequest>,
) -> Result<Json<ControlState>, StatusCode> {
    let mut monitor = state.monitor.lock().await;

    match monitor.select_room(&request.room_id) {
        Ok(()) => Ok(Json(control_state(&monitor))),
        Err(SimulatorError::UnknownRoom(room_id)) => {
            warn!(room_id = %room_id, "Unknown room selected");
            Err(StatusCode::NOT_FOUND)
        }
        Err(e) => {
            warn!(error = %e, "Failed to select room");
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

fn control_state(monitor: &crate::simulator::Monitor) -> ControlState {
    ControlState {
        paused: monitor.is_paused(),
        muted: monitor.is_muted(),
        selected_room: monitor.selected_room().to_string(),
    }
}
