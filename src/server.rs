//! Local HTTP surface for the dashboard frontend.
//!
//! The agent owns all monitoring state; the browser dashboard reads it
//! over this API and can force an immediate poll:
//!
//! - `GET  /health`       - liveness + version
//! - `GET  /readings`     - retained reading window, most recent first
//! - `GET  /predictions`  - retained prediction records with status
//! - `GET  /sessions`     - active and completed fire sessions
//! - `POST /refresh`      - trigger an immediate poll of all sources

use crate::core::FireAlertSession;
use crate::monitor::MonitorState;
use crate::predict::MlPrediction;
use crate::reading::SensorReading;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{Notify, RwLock};
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
}

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    monitor: Arc<RwLock<MonitorState>>,
    refresh: Arc<Notify>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Reading window plus the per-source error states.
#[derive(Serialize)]
pub struct ReadingsResponse {
    pub readings: Vec<SensorReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerts_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_error: Option<String>,
}

#[derive(Serialize)]
pub struct PredictionsResponse {
    pub predictions: Vec<MlPrediction>,
}

#[derive(Serialize)]
pub struct SessionsResponse {
    pub active: Vec<FireAlertSession>,
    pub history: Vec<FireAlertSession>,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub status: String,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /readings
async fn readings(State(state): State<ServerState>) -> Json<ReadingsResponse> {
    let monitor = state.monitor.read().await;
    Json(ReadingsResponse {
        readings: monitor.history.to_vec(),
        alerts_error: monitor.alerts_error.clone(),
        weather_error: monitor.weather_error.clone(),
    })
}

/// GET /predictions
async fn predictions(State(state): State<ServerState>) -> Json<PredictionsResponse> {
    let monitor = state.monitor.read().await;
    Json(PredictionsResponse {
        predictions: monitor.requester.to_vec(),
    })
}

/// GET /sessions
async fn sessions(State(state): State<ServerState>) -> Json<SessionsResponse> {
    let monitor = state.monitor.read().await;
    Json(SessionsResponse {
        active: monitor.tracker.active_sessions(),
        history: monitor.tracker.completed_sessions().to_vec(),
    })
}

/// POST /refresh
async fn refresh(State(state): State<ServerState>) -> Json<RefreshResponse> {
    state.refresh.notify_one();
    Json(RefreshResponse {
        status: "refresh scheduled".to_string(),
    })
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
    monitor: Arc<RwLock<MonitorState>>,
    refresh_handle: Arc<Notify>,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = ServerState {
        monitor,
        refresh: refresh_handle,
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/readings", get(readings))
        .route("/predictions", get(predictions))
        .route("/sessions", get(sessions))
        .route("/refresh", post(refresh))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("dashboard API listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("server shutdown signal received");
            })
            .await
        {
            tracing::error!("server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
