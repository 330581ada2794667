//! Configuration for the Firewatch agent.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the monitoring agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Interval between polls of the alerts endpoint
    #[serde(with = "duration_serde")]
    pub poll_interval: Duration,

    /// Remote endpoints the agent talks to
    pub endpoints: EndpointConfig,

    /// Path for persisted sessions and agent state
    pub data_path: PathBuf,

    /// Whether polling is currently paused
    pub paused: bool,

    /// Retained-window and persistence caps
    pub caps: CapConfig,

    /// Channel thresholds that qualify a reading for AI analysis
    pub thresholds: ThresholdConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("firewatch-agent");

        Self {
            poll_interval: Duration::from_secs(30),
            endpoints: EndpointConfig::default(),
            data_path: data_dir,
            paused: false,
            caps: CapConfig::default(),
            thresholds: ThresholdConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("firewatch-agent")
            .join("config.json")
    }

    /// Path of the persisted session history blob.
    pub fn session_store_path(&self) -> PathBuf {
        self.data_path.join("sessions.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Remote endpoints consumed by the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Alerts list endpoint (polled)
    pub alerts_url: String,
    /// Optional bearer token for the alerts API
    pub alerts_token: Option<String>,
    /// Current weather endpoint
    pub weather_url: String,
    /// Optional API key appended to weather requests
    pub weather_api_key: Option<String>,
    /// AI inference endpoint
    pub inference_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            alerts_url: "http://127.0.0.1:8000/api/alerts".to_string(),
            alerts_token: None,
            weather_url: "http://127.0.0.1:8000/api/weather".to_string(),
            weather_api_key: None,
            inference_url: "http://127.0.0.1:8000/api/predict".to_string(),
        }
    }
}

/// Bounds on retained in-memory windows and the persisted history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapConfig {
    /// Most-recent readings retained for display and duplicate checks
    pub reading_history: usize,
    /// Readings retained on each session while it is open
    pub session_readings: usize,
    /// Most-recent predictions retained
    pub predictions: usize,
    /// Completed sessions kept in the durable store
    pub stored_sessions: usize,
}

impl Default for CapConfig {
    fn default() -> Self {
        Self {
            reading_history: 50,
            session_readings: 50,
            predictions: 20,
            stored_sessions: 10,
        }
    }
}

/// Channel levels above which a reading qualifies for AI analysis
/// even when the sensor has not asserted the fire flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Warning temperature in degrees Celsius
    pub warn_temperature: f64,
    /// Warning smoke level (sensor units)
    pub warn_smoke: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            warn_temperature: 45.0,
            warn_smoke: 60.0,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
