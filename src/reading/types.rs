//! Reading types for the Firewatch agent.
//!
//! `RawReading` mirrors the loosely-typed upstream record; `SensorReading`
//! is the canonical value every downstream component consumes. The raw
//! shape never leaks past the ingestor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One device record as returned by the alerts API.
///
/// The upstream API is not fully trusted: any field may be missing or
/// null, so every field is optional and deserialization never fails on
/// absent structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReading {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "deviceId")]
    pub device_id: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub smoke: Option<f64>,
    #[serde(default, alias = "isFire")]
    pub is_fire: Option<bool>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// One polled sensor observation, fully populated.
///
/// Immutable once created; referenced but never mutated by the session
/// tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorReading {
    /// Server-assigned or locally synthesized identifier
    pub id: String,
    /// Stable identifier of the physical sensor
    pub device_id: String,
    /// Location in floating-point degrees (0,0 means "no location")
    pub latitude: f64,
    pub longitude: f64,
    /// Sensor channels
    pub humidity: f64,
    pub temperature: f64,
    pub smoke: f64,
    /// Fire flag asserted by the upstream detection device
    pub is_fire: bool,
    /// Observation time (ingestion time if the payload omitted it)
    pub timestamp: DateTime<Utc>,
}

impl SensorReading {
    /// Normalize a raw record, substituting defaults for missing fields.
    ///
    /// Never fails: absence of required structure degrades to defaults
    /// rather than rejecting the payload.
    pub fn from_raw(raw: RawReading) -> Self {
        Self {
            id: raw.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            device_id: raw.device_id.unwrap_or_else(|| "unknown".to_string()),
            latitude: raw.latitude.unwrap_or(0.0),
            longitude: raw.longitude.unwrap_or(0.0),
            humidity: raw.humidity.unwrap_or(0.0),
            temperature: raw.temperature.unwrap_or(0.0),
            smoke: raw.smoke.unwrap_or(0.0),
            is_fire: raw.is_fire.unwrap_or(false),
            timestamp: raw.timestamp.unwrap_or_else(Utc::now),
        }
    }

    /// Whether this reading carries a usable location.
    ///
    /// `0,0` and NaN coordinates mean the device did not report one.
    pub fn has_location(&self) -> bool {
        if self.latitude.is_nan() || self.longitude.is_nan() {
            return false;
        }
        self.latitude != 0.0 || self.longitude != 0.0
    }
}
