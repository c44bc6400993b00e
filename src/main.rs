//! Wardwatch - A simulated patient-room monitoring service.
//!
//! # API Endpoints
//!
//! - `GET /snapshot` - Full simulator state
//! - `GET /rooms`, `GET /alerts`, `GET /stats`, `GET /sensor` - Partial views
//! - `GET /config`, `PUT /config` - Detection configuration
//! - `POST /alerts/:id/acknowledge` - Acknowledge an alert
//! - `POST /events` - Trigger an event on the selected room
//! - `POST /pause`, `POST /mute`, `PUT /selected-room` - Session controls
//! - `GET /health` - Health check

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use wardwatch::api::{AppState, router};
use wardwatch::audio::ToneAudio;
use wardwatch::config::ServerConfig;
use wardwatch::scheduler::{Scheduler, TickPeriods};
use wardwatch::simulator::MonitoringSimulator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("wardwatch=info".parse()?))
        .init();

    let config = ServerConfig::from_env();

    info!(
        port = config.port,
        seed = ?config.seed,
        tick_ms = config.tick.as_millis() as u64,
        audio = config.audio_enabled,
        "Starting Wardwatch"
    );

    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let audio = if config.audio_enabled {
        ToneAudio::new()
    } else {
        ToneAudio::unavailable("disabled by WARDWATCH_AUDIO")
    };

    let mut simulator = MonitoringSimulator::new(rng, audio, Utc::now());
    if let Err(e) = simulator.select_room(&config.selected_room) {
        warn!(error = %e, "Keeping default selected room");
    }

    let monitor = Arc::new(Mutex::new(simulator));
    let scheduler = Scheduler::start(monitor.clone(), TickPeriods::from_unit(config.tick));

    let app = router(AppState { monitor });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Wardwatch is listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await;
    info!("Wardwatch stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
