//! AI prediction requests against the inference endpoint.
//!
//! Each qualifying reading issues one inference request tracked as an
//! `MlPrediction` record: created in `processing`, transitioned exactly
//! once to `completed` or `failed`. A failed prediction is terminal;
//! a fresh request is only issued by a later qualifying reading.
//!
//! The inference API speaks the category contract: risk code 0 (normal),
//! 1 (high risk) or 2 (borderline) with a level label, message and
//! probability map. Only code 1 counts as confirmed fire risk for
//! session tracking; borderline never opens or extends a session.

use crate::reading::SensorReading;
use crate::weather::WeatherConditions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// Risk category returned by the inference model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    /// Code 0 - no elevated risk
    Normal,
    /// Code 1 - confirmed fire risk
    High,
    /// Code 2 - borderline, needs human review
    Borderline,
}

impl RiskCategory {
    /// Map a wire category code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RiskCategory::Normal),
            1 => Some(RiskCategory::High),
            2 => Some(RiskCategory::Borderline),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            RiskCategory::Normal => 0,
            RiskCategory::High => 1,
            RiskCategory::Borderline => 2,
        }
    }

    /// Whether this category corroborates the sensor's fire signal.
    pub fn is_fire_risk(&self) -> bool {
        matches!(self, RiskCategory::High)
    }
}

/// Completed inference result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub category: RiskCategory,
    /// Human-readable level label from the model ("normal", "high", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// User-facing message from the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Per-category probability map, when the model reports one
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub probabilities: HashMap<String, f64>,
}

/// Lifecycle state of one inference request.
///
/// Result data exists only in the `Completed` variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionStatus {
    Processing,
    Completed(PredictionResult),
    Failed { message: String },
}

/// One inference request/response cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlPrediction {
    /// Locally generated, unique per request
    pub id: String,
    /// Device whose reading triggered the request
    pub device_id: String,
    /// Request initiation time
    pub timestamp: DateTime<Utc>,
    /// The exact numeric payload sent to the endpoint
    pub input: InferenceInput,
    #[serde(flatten)]
    pub status: PredictionStatus,
}

impl MlPrediction {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, PredictionStatus::Completed(_))
    }

    /// Whether this prediction completed with a confirmed fire risk.
    pub fn indicates_fire_risk(&self) -> bool {
        match &self.status {
            PredictionStatus::Completed(result) => result.category.is_fire_risk(),
            _ => false,
        }
    }
}

/// Numeric payload sent to the inference endpoint: sensor channels plus
/// weather-derived fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceInput {
    pub temperature: f64,
    pub humidity: f64,
    pub smoke: f64,
    pub ambient_temperature: f64,
    pub ambient_humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_gust: f64,
    pub visibility: f64,
}

impl InferenceInput {
    /// Build the payload from a reading and optional weather context.
    ///
    /// Missing weather degrades to zeroed ambient fields rather than
    /// blocking the request.
    pub fn from_reading(reading: &SensorReading, weather: Option<&WeatherConditions>) -> Self {
        let mut input = Self {
            temperature: reading.temperature,
            humidity: reading.humidity,
            smoke: reading.smoke,
            ..Default::default()
        };

        if let Some(w) = weather {
            input.ambient_temperature = w.temperature;
            input.ambient_humidity = w.humidity;
            input.pressure = w.pressure;
            input.wind_speed = w.wind_speed;
            input.wind_gust = w.wind_gust.unwrap_or(0.0);
            input.visibility = w.visibility;
        }

        input
    }
}

/// Prediction request errors.
#[derive(Debug)]
pub enum PredictionError {
    /// Network/HTTP error
    Network(String),
    /// Server returned an error response
    Server { status: u16, message: String },
    /// Response did not match the category contract
    Contract(String),
}

impl std::fmt::Display for PredictionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictionError::Network(msg) => write!(f, "Inference network error: {msg}"),
            PredictionError::Server { status, message } => {
                write!(f, "Inference server error ({status}): {message}")
            }
            PredictionError::Contract(msg) => write!(f, "Inference contract error: {msg}"),
        }
    }
}

impl std::error::Error for PredictionError {}

/// Raw response shape of the inference endpoint.
#[derive(Debug, Deserialize)]
struct InferenceResponse {
    prediction: u8,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    probabilities: Option<HashMap<String, f64>>,
}

/// HTTP client for the inference endpoint.
pub struct InferenceClient {
    url: String,
    client: reqwest::Client,
    agent_id: String,
}

impl InferenceClient {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        let host = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let agent_id = format!("firewatch-{}-{}", host, &Uuid::new_v4().to_string()[..8]);

        Self {
            url: url.into(),
            client,
            agent_id,
        }
    }

    /// Run one inference call.
    pub async fn infer(&self, input: &InferenceInput) -> Result<PredictionResult, PredictionError> {
        let response = self
            .client
            .post(&self.url)
            .header("X-Agent-Id", &self.agent_id)
            .json(input)
            .send()
            .await
            .map_err(|e| PredictionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PredictionError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let raw: InferenceResponse = response
            .json()
            .await
            .map_err(|e| PredictionError::Contract(e.to_string()))?;

        let category = RiskCategory::from_code(raw.prediction).ok_or_else(|| {
            PredictionError::Contract(format!("unknown risk category code {}", raw.prediction))
        })?;

        Ok(PredictionResult {
            category,
            level: raw.level,
            message: raw.message,
            probabilities: raw.probabilities.unwrap_or_default(),
        })
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }
}

/// Tracks inference requests through their lifecycle and retains a
/// bounded most-recent-first history.
pub struct PredictionRequester {
    predictions: VecDeque<MlPrediction>,
    cap: usize,
}

impl PredictionRequester {
    pub fn new(cap: usize) -> Self {
        Self {
            predictions: VecDeque::with_capacity(cap),
            cap: cap.max(1),
        }
    }

    /// Record a new request in `processing` state and return its id.
    ///
    /// The caller runs the actual inference call out of band and
    /// settles the record through [`resolve`](Self::resolve).
    pub fn begin(&mut self, device_id: &str, input: InferenceInput) -> String {
        let id = Uuid::new_v4().to_string();
        self.predictions.push_front(MlPrediction {
            id: id.clone(),
            device_id: device_id.to_string(),
            timestamp: Utc::now(),
            input,
            status: PredictionStatus::Processing,
        });
        self.predictions.truncate(self.cap);
        id
    }

    /// Resolve a processing record by identity. Completed and failed
    /// records are terminal and never transition again.
    pub fn resolve(&mut self, id: &str, status: PredictionStatus) {
        if let Some(record) = self.predictions.iter_mut().find(|p| p.id == id) {
            if matches!(record.status, PredictionStatus::Processing) {
                record.status = status;
            }
        }
    }

    /// Look up a retained record by id.
    pub fn get(&self, id: &str) -> Option<&MlPrediction> {
        self.predictions.iter().find(|p| p.id == id)
    }

    /// Retained predictions, most recent first.
    pub fn to_vec(&self) -> Vec<MlPrediction> {
        self.predictions.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(device: &str, category: RiskCategory) -> MlPrediction {
        MlPrediction {
            id: Uuid::new_v4().to_string(),
            device_id: device.to_string(),
            timestamp: Utc::now(),
            input: InferenceInput::default(),
            status: PredictionStatus::Completed(PredictionResult {
                category,
                level: None,
                message: None,
                probabilities: HashMap::new(),
            }),
        }
    }

    #[test]
    fn test_risk_category_codes() {
        assert_eq!(RiskCategory::from_code(0), Some(RiskCategory::Normal));
        assert_eq!(RiskCategory::from_code(1), Some(RiskCategory::High));
        assert_eq!(RiskCategory::from_code(2), Some(RiskCategory::Borderline));
        assert_eq!(RiskCategory::from_code(3), None);
    }

    #[test]
    fn test_only_high_is_fire_risk() {
        assert!(!completed("D", RiskCategory::Normal).indicates_fire_risk());
        assert!(completed("D", RiskCategory::High).indicates_fire_risk());
        // Borderline needs human review; it never drives sessions
        assert!(!completed("D", RiskCategory::Borderline).indicates_fire_risk());
    }

    #[test]
    fn test_status_serde_tagging() {
        let prediction = completed("DEV-1", RiskCategory::High);
        let json = serde_json::to_value(&prediction).unwrap();

        assert_eq!(json["status"], "completed");
        assert_eq!(json["category"], "high");

        let restored: MlPrediction = serde_json::from_value(json).unwrap();
        assert!(restored.indicates_fire_risk());
    }

    #[test]
    fn test_processing_serde() {
        let prediction = MlPrediction {
            id: "p-1".to_string(),
            device_id: "DEV-1".to_string(),
            timestamp: Utc::now(),
            input: InferenceInput::default(),
            status: PredictionStatus::Processing,
        };

        let json = serde_json::to_value(&prediction).unwrap();
        assert_eq!(json["status"], "processing");
        assert!(json.get("category").is_none());
    }

    #[test]
    fn test_input_from_reading_without_weather() {
        let reading = SensorReading::from_raw(crate::reading::RawReading {
            temperature: Some(41.0),
            humidity: Some(20.0),
            smoke: Some(80.0),
            ..Default::default()
        });

        let input = InferenceInput::from_reading(&reading, None);
        assert_eq!(input.temperature, 41.0);
        assert_eq!(input.smoke, 80.0);
        assert_eq!(input.ambient_temperature, 0.0);
        assert_eq!(input.wind_speed, 0.0);
    }

    #[test]
    fn test_begin_starts_processing() {
        let mut requester = PredictionRequester::new(5);
        let id = requester.begin("DEV-1", InferenceInput::default());

        let record = requester.get(&id).unwrap();
        assert_eq!(record.device_id, "DEV-1");
        assert!(matches!(record.status, PredictionStatus::Processing));
        assert!(!record.is_completed());
    }

    #[test]
    fn test_resolve_is_terminal() {
        let mut requester = PredictionRequester::new(5);
        let id = requester.begin("DEV-1", InferenceInput::default());

        requester.resolve(
            &id,
            PredictionStatus::Failed {
                message: "connection refused".to_string(),
            },
        );
        // A late completion must not supersede the terminal failure
        requester.resolve(
            &id,
            PredictionStatus::Completed(PredictionResult {
                category: RiskCategory::High,
                level: None,
                message: None,
                probabilities: HashMap::new(),
            }),
        );

        assert!(matches!(
            requester.get(&id).unwrap().status,
            PredictionStatus::Failed { .. }
        ));
    }

    #[test]
    fn test_begin_caps_history() {
        let mut requester = PredictionRequester::new(2);
        let first = requester.begin("DEV-1", InferenceInput::default());
        requester.begin("DEV-1", InferenceInput::default());
        let third = requester.begin("DEV-1", InferenceInput::default());

        assert_eq!(requester.len(), 2);
        assert!(requester.get(&first).is_none());
        assert!(requester.get(&third).is_some());
    }
}
