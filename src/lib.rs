//! Wardwatch - A simulated patient-room monitoring service.
//!
//! # Overview
//!
//! Wardwatch keeps a small set of monitored rooms, randomly raises alerts for
//! them (falls, risky behavior, distress), and tracks how operators resolve
//! those alerts. Detection is simulated: alerts come from a seeded random
//! generator shaped by the detection configuration, not from real sensors.
//!
//! # Privacy
//!
//! No video, pose data, or raw sensor streams exist anywhere in the system.
//! Rooms run in privacy mode and logs carry room and alert identifiers only.
//!
//! # Modules
//!
//! - [`model`]: Rooms, alerts, sensor data, and API request/response types
//! - [`config`]: Detection configuration and environment settings
//! - [`simulator`]: The monitoring state machine
//! - [`scheduler`]: Periodic tasks that drive the simulator
//! - [`audio`]: Alert cues and the audio output boundary
//! - [`api`]: HTTP API handlers
//! - [`error`]: Error types

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod model;
pub mod scheduler;
pub mod simulator;
