//! Periodic simulation tasks.
//!
//! Each timer of the simulation (alert generation, sensor drift, metric
//! drift, escalation sweep) runs as its own tokio task that locks the shared
//! state for one short transition per tick. Every task is owned by a
//! [`TaskHandle`], so teardown is one explicit call per task.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::audio::AudioSink;
use crate::simulator::MonitoringSimulator;

/// Periods of the simulation timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPeriods {
    pub alert_generation: Duration,
    pub sensor_drift: Duration,
    pub room_metrics: Duration,
    pub escalation: Duration,
}

impl TickPeriods {
    /// Standard periods expressed in multiples of one time unit.
    pub fn from_unit(unit: Duration) -> Self {
        Self {
            alert_generation: unit * 6,
            sensor_drift: unit,
            room_metrics: unit * 2,
            escalation: unit * 5,
        }
    }
}

impl Default for TickPeriods {
    fn default() -> Self {
        Self::from_unit(Duration::from_secs(1))
    }
}

/// A running periodic task.
pub struct TaskHandle {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl TaskHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stop the task and wait for it to wind down. Safe to call on a
    /// task that already stopped.
    pub async fn cancel(self) {
        self.handle.abort();
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                tracing::warn!(task = self.name, error = %e, "Periodic task failed");
            }
        }
        debug!(task = self.name, "Periodic task stopped");
    }
}

/// Run `tick` against the shared target every `period`.
///
/// The first tick fires one full period after spawning.
pub fn spawn_periodic<T, F>(
    name: &'static str,
    period: Duration,
    target: Arc<Mutex<T>>,
    mut tick: F,
) -> TaskHandle
where
    T: Send + 'static,
    F: FnMut(&mut T) + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let mut guard = target.lock().await;
            tick(&mut *guard);
        }
    });

    TaskHandle { name, handle }
}

/// Owner of all simulation timers.
pub struct Scheduler {
    tasks: Vec<TaskHandle>,
}

impl Scheduler {
    /// Start every simulation timer against the shared simulator.
    pub fn start<R, A>(simulator: Arc<Mutex<MonitoringSimulator<R, A>>>, periods: TickPeriods) -> Self
    where
        R: Rng + Send + 'static,
        A: AudioSink + 'static,
    {
        let tasks = vec![
            spawn_periodic(
                "alert_generation",
                periods.alert_generation,
                simulator.clone(),
                |sim| {
                    sim.generation_tick(Utc::now());
                },
            ),
            spawn_periodic(
                "sensor_drift",
                periods.sensor_drift,
                simulator.clone(),
                |sim| sim.drift_sensor_data(),
            ),
            spawn_periodic(
                "room_metrics",
                periods.room_metrics,
                simulator.clone(),
                |sim| sim.drift_room_metrics(),
            ),
            spawn_periodic("escalation", periods.escalation, simulator, |sim| {
                sim.escalate_overdue(Utc::now());
            }),
        ];

        info!(
            generation_ms = periods.alert_generation.as_millis() as u64,
            sensor_ms = periods.sensor_drift.as_millis() as u64,
            metrics_ms = periods.room_metrics.as_millis() as u64,
            escalation_ms = periods.escalation.as_millis() as u64,
            "Simulation timers started"
        );

        Self { tasks }
    }

    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(TaskHandle::name).collect()
    }

    /// Cancel every timer.
    pub async fn shutdown(self) {
        for task in self.tasks {
            task.cancel().await;
        }
        info!("Simulation timers stopped");
    }
}
