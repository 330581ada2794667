//! The polling loop driving the reading pipeline.
//!
//! One owned `Monitor` per agent: it polls the alerts endpoint on the
//! configured interval (or immediately on a manual refresh), pushes each
//! record through normalize -> duplicate filter -> optional AI analysis
//! -> session tracker, and shares the resulting state with the HTTP
//! surface. All mutation happens on this one task; the HTTP surface
//! only reads.

use crate::alerts::AlertsClient;
use crate::config::Config;
use crate::core::{SessionStore, SessionTracker, SessionTransition};
use crate::predict::{InferenceClient, InferenceInput, PredictionRequester, PredictionStatus};
use crate::reading::{ReadingHistory, SensorReading};
use crate::weather::{WeatherClient, WeatherConditions};
use std::sync::Arc;
use tokio::sync::{oneshot, Notify, RwLock};

/// Mutable monitoring state shared between the poll task and the HTTP
/// surface.
pub struct MonitorState {
    /// Retained reading window, most recent first
    pub history: ReadingHistory,
    /// Prediction lifecycle records
    pub requester: PredictionRequester,
    /// Per-device session state machine
    pub tracker: SessionTracker,
    /// Last alerts-source error, cleared on a successful poll
    pub alerts_error: Option<String>,
    /// Last weather-source error, cleared on a successful fetch
    pub weather_error: Option<String>,
}

/// Polls the alert sources and feeds the session tracker.
pub struct Monitor {
    config: Config,
    alerts: AlertsClient,
    weather: WeatherClient,
    inference: InferenceClient,
    state: Arc<RwLock<MonitorState>>,
    refresh: Arc<Notify>,
}

impl Monitor {
    pub fn new(config: Config) -> Self {
        let alerts = AlertsClient::new(
            config.endpoints.alerts_url.clone(),
            config.endpoints.alerts_token.clone(),
        );
        let weather = WeatherClient::new(
            config.endpoints.weather_url.clone(),
            config.endpoints.weather_api_key.clone(),
        );
        let inference = InferenceClient::new(config.endpoints.inference_url.clone());

        let store = SessionStore::new(config.session_store_path(), config.caps.stored_sessions);
        let tracker = SessionTracker::new(store, config.caps.session_readings, config.caps.predictions);

        let state = MonitorState {
            history: ReadingHistory::new(config.caps.reading_history),
            requester: PredictionRequester::new(config.caps.predictions),
            tracker,
            alerts_error: None,
            weather_error: None,
        };

        Self {
            config,
            alerts,
            weather,
            inference,
            state: Arc::new(RwLock::new(state)),
            refresh: Arc::new(Notify::new()),
        }
    }

    /// Shared state handle for the HTTP surface.
    pub fn state(&self) -> Arc<RwLock<MonitorState>> {
        Arc::clone(&self.state)
    }

    /// Handle used to trigger an immediate poll.
    pub fn refresh_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.refresh)
    }

    /// Run the poll loop until shutdown.
    ///
    /// Shutdown abandons any in-flight poll, so delayed prediction
    /// results are never applied after teardown.
    pub async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        let mut paused = self.config.paused;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.refresh.notified() => {
                    tracing::info!("manual refresh requested");
                }
                _ = &mut shutdown => {
                    tracing::info!("monitor shutting down");
                    break;
                }
            }

            // Reload config each tick so `firewatch pause/resume` from
            // another process controls a running agent.
            if let Ok(cfg) = Config::load() {
                if cfg.paused != paused {
                    paused = cfg.paused;
                    tracing::info!(paused, "pause state changed");
                }
            }
            if paused {
                continue;
            }

            tokio::select! {
                _ = self.poll_once() => {}
                _ = &mut shutdown => {
                    tracing::info!("monitor shutting down, discarding in-flight poll");
                    break;
                }
            }
        }
    }

    /// Whether a reading should be sent for AI analysis: sensor fire
    /// flag, or a channel above the warning thresholds. Cheaper
    /// deployments poll too often to analyze every reading.
    fn qualifies_for_analysis(&self, reading: &SensorReading) -> bool {
        reading.is_fire
            || reading.temperature >= self.config.thresholds.warn_temperature
            || reading.smoke >= self.config.thresholds.warn_smoke
    }

    /// Run one full poll of the alerts endpoint.
    ///
    /// The state lock is held only for the short bookkeeping steps; the
    /// weather and inference calls run with it released so the HTTP
    /// surface stays responsive during a slow poll.
    pub async fn poll_once(&self) {
        let records = match self.alerts.fetch_all().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "alerts poll failed");
                self.state.write().await.alerts_error = Some(e.to_string());
                return;
            }
        };

        tracing::debug!(count = records.len(), "alerts poll returned");
        self.state.write().await.alerts_error = None;

        for raw in records {
            let reading = SensorReading::from_raw(raw);

            if !self.state.write().await.history.push_if_new(reading.clone()) {
                continue;
            }

            // Only the prediction issued for this reading feeds the
            // tracker. An older completed prediction says nothing about
            // the current state of the device and must not keep a
            // cleared session open.
            let prediction_id = if self.qualifies_for_analysis(&reading) {
                Some(self.request_prediction(&reading).await)
            } else {
                None
            };

            let mut guard = self.state.write().await;
            let state = &mut *guard;
            let prediction = prediction_id
                .as_deref()
                .and_then(|id| state.requester.get(id))
                .filter(|p| p.is_completed());
            let transition = state.tracker.observe(&reading, prediction);
            if transition != SessionTransition::Idle {
                tracing::debug!(device = %reading.device_id, ?transition, "reading processed");
            }
        }
    }

    /// Issue one inference request for a qualifying reading and settle
    /// its lifecycle record. Returns the record id.
    async fn request_prediction(&self, reading: &SensorReading) -> String {
        let weather = self.fetch_weather(reading).await;
        let input = InferenceInput::from_reading(reading, weather.as_ref());

        let id = self
            .state
            .write()
            .await
            .requester
            .begin(&reading.device_id, input.clone());

        let status = match self.inference.infer(&input).await {
            Ok(result) => {
                tracing::debug!(
                    device = %reading.device_id,
                    category = result.category.code(),
                    "inference completed"
                );
                PredictionStatus::Completed(result)
            }
            Err(e) => {
                tracing::warn!(device = %reading.device_id, error = %e, "inference failed");
                PredictionStatus::Failed {
                    message: e.to_string(),
                }
            }
        };

        self.state.write().await.requester.resolve(&id, status);
        id
    }

    /// Best-effort weather context for an analysis request.
    async fn fetch_weather(&self, reading: &SensorReading) -> Option<WeatherConditions> {
        if !reading.has_location() {
            return None;
        }

        match self.weather.fetch(reading.latitude, reading.longitude).await {
            Ok(conditions) => {
                self.state.write().await.weather_error = None;
                Some(conditions)
            }
            Err(e) => {
                tracing::warn!(error = %e, "weather fetch failed, proceeding without context");
                self.state.write().await.weather_error = Some(e.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.data_path = std::env::temp_dir()
            .join("firewatch-monitor-test")
            .join(Uuid::new_v4().to_string());
        config.poll_interval = Duration::from_millis(50);
        // Nothing listens on port 1
        config.endpoints.alerts_url = "http://127.0.0.1:1/alerts".to_string();
        config.endpoints.weather_url = "http://127.0.0.1:1/weather".to_string();
        config.endpoints.inference_url = "http://127.0.0.1:1/predict".to_string();
        config
    }

    #[tokio::test]
    async fn test_poll_failure_records_source_error() {
        let monitor = Monitor::new(test_config());
        monitor.poll_once().await;

        let state = monitor.state();
        let state = state.read().await;
        assert!(state.alerts_error.is_some());
        assert!(state.history.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let monitor = Monitor::new(test_config());
        let (tx, rx) = oneshot::channel();

        let handle = tokio::spawn(monitor.run(rx));
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("monitor did not shut down")
            .unwrap();
    }
}
