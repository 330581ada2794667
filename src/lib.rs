//! Firewatch Agent - forest fire sensor network monitor.
//!
//! This library polls a remote alert API for sensor readings, confirms
//! fire signals against an AI inference service, tracks contiguous fire
//! episodes as durable per-device sessions, and serves the live view to
//! a dashboard frontend.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Firewatch Agent                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌───────────┐   ┌───────────┐   ┌─────────┐  │
//! │  │  Poller  │──▶│ Ingest +  │──▶│  Session  │──▶│ Session │  │
//! │  │ (alerts) │   │   dedup   │   │  tracker  │   │  store  │  │
//! │  └──────────┘   └───────────┘   └───────────┘   └─────────┘  │
//! │        │              │                ▲                     │
//! │        ▼              ▼                │                     │
//! │  ┌──────────┐   ┌───────────────────────┐                    │
//! │  │ Weather  │──▶│  Prediction requester │                    │
//! │  └──────────┘   └───────────────────────┘                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sensor hardware already performs fire detection (`is_fire`); this
//! agent exists to tolerate the slower AI confirmation signal arriving
//! asynchronously and to produce a durable, retrospective record of each
//! fire episode without a server-side session concept.

pub mod alerts;
pub mod config;
pub mod core;
pub mod monitor;
pub mod predict;
pub mod reading;
pub mod server;
pub mod weather;

// Re-export key types at crate root for convenience
pub use alerts::{AlertsClient, AlertsError};
pub use config::{CapConfig, Config, ConfigError, EndpointConfig, ThresholdConfig};
pub use crate::core::{
    FireAlertSession, SessionStatus, SessionStore, SessionTracker, SessionTransition,
};
pub use monitor::{Monitor, MonitorState};
pub use predict::{
    InferenceClient, InferenceInput, MlPrediction, PredictionRequester, PredictionStatus,
    RiskCategory,
};
pub use reading::{is_duplicate, RawReading, ReadingHistory, SensorReading};
pub use weather::{WeatherClient, WeatherConditions, WeatherError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
