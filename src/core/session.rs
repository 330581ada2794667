//! Fire alert session type and its per-reading aggregates.

use crate::predict::MlPrediction;
use crate::reading::SensorReading;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a session is still being extended or has been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
}

/// A contiguous span of fire activity for one device.
///
/// Opened by the first qualifying reading, extended by each subsequent
/// qualifying reading for the same device, closed by the first
/// non-qualifying one. `readings` is kept most-recent-first and capped,
/// so the average aggregates are defined over the retained window and
/// can shift when old readings are evicted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FireAlertSession {
    pub id: String,
    pub device_id: String,
    pub start_time: DateTime<Utc>,
    /// Set when the session closes; `end_time >= start_time`
    pub end_time: Option<DateTime<Utc>>,
    /// Readings observed while open, most recent first, capped
    pub readings: Vec<SensorReading>,
    /// Predictions correlated to this session's readings, capped
    pub ml_predictions: Vec<MlPrediction>,
    pub max_temp: f64,
    pub min_temp: f64,
    pub avg_temp: f64,
    pub max_smoke: f64,
    pub min_smoke: f64,
    pub avg_smoke: f64,
    pub max_humidity: f64,
    pub min_humidity: f64,
    pub avg_humidity: f64,
    pub status: SessionStatus,
    /// Sticky-true once any correlated prediction indicated fire risk
    pub ml_confirmed: bool,
}

impl FireAlertSession {
    /// Open a new session seeded from one reading.
    pub fn open(reading: &SensorReading, ml_confirmed: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            device_id: reading.device_id.clone(),
            start_time: reading.timestamp,
            end_time: None,
            readings: vec![reading.clone()],
            ml_predictions: Vec::new(),
            max_temp: reading.temperature,
            min_temp: reading.temperature,
            avg_temp: reading.temperature,
            max_smoke: reading.smoke,
            min_smoke: reading.smoke,
            avg_smoke: reading.smoke,
            max_humidity: reading.humidity,
            min_humidity: reading.humidity,
            avg_humidity: reading.humidity,
            status: SessionStatus::Active,
            ml_confirmed,
        }
    }

    /// Extend with a qualifying reading.
    ///
    /// Min/max compare against the prior extrema; the averages reduce
    /// over the full retained readings list after the cap is applied.
    pub fn extend(&mut self, reading: &SensorReading, reading_cap: usize) {
        self.readings.insert(0, reading.clone());
        self.readings.truncate(reading_cap.max(1));

        self.max_temp = self.max_temp.max(reading.temperature);
        self.min_temp = self.min_temp.min(reading.temperature);
        self.max_smoke = self.max_smoke.max(reading.smoke);
        self.min_smoke = self.min_smoke.min(reading.smoke);
        self.max_humidity = self.max_humidity.max(reading.humidity);
        self.min_humidity = self.min_humidity.min(reading.humidity);

        let count = self.readings.len() as f64;
        self.avg_temp = self.readings.iter().map(|r| r.temperature).sum::<f64>() / count;
        self.avg_smoke = self.readings.iter().map(|r| r.smoke).sum::<f64>() / count;
        self.avg_humidity = self.readings.iter().map(|r| r.humidity).sum::<f64>() / count;
    }

    /// Attach a prediction correlated to this session's readings.
    ///
    /// `ml_confirmed` becomes true permanently once any attached
    /// prediction indicates fire risk.
    pub fn correlate_prediction(&mut self, prediction: &MlPrediction, prediction_cap: usize) {
        if self.ml_predictions.iter().any(|p| p.id == prediction.id) {
            return;
        }

        if prediction.indicates_fire_risk() {
            self.ml_confirmed = true;
        }

        self.ml_predictions.insert(0, prediction.clone());
        self.ml_predictions.truncate(prediction_cap.max(1));
    }

    /// Close the session at the timestamp of the reading that cleared it.
    pub fn close(&mut self, end_time: DateTime<Utc>) {
        self.end_time = Some(end_time);
        self.status = SessionStatus::Completed;
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::RawReading;
    use chrono::TimeZone;

    fn reading(temp: f64, offset_secs: i64) -> SensorReading {
        let mut r = SensorReading::from_raw(RawReading {
            device_id: Some("DEV-1".to_string()),
            temperature: Some(temp),
            humidity: Some(30.0),
            smoke: Some(50.0),
            is_fire: Some(true),
            ..Default::default()
        });
        r.timestamp = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
            + chrono::Duration::seconds(offset_secs);
        r
    }

    #[test]
    fn test_open_seeds_aggregates() {
        let session = FireAlertSession::open(&reading(41.0, 0), false);

        assert_eq!(session.max_temp, 41.0);
        assert_eq!(session.min_temp, 41.0);
        assert_eq!(session.avg_temp, 41.0);
        assert_eq!(session.readings.len(), 1);
        assert!(session.is_active());
        assert!(session.end_time.is_none());
    }

    #[test]
    fn test_extend_updates_extrema_and_average() {
        let mut session = FireAlertSession::open(&reading(41.0, 0), false);
        session.extend(&reading(45.0, 30), 50);

        assert_eq!(session.max_temp, 45.0);
        assert_eq!(session.min_temp, 41.0);
        assert_eq!(session.avg_temp, 43.0);
        assert_eq!(session.readings.len(), 2);
        // Most recent first
        assert_eq!(session.readings[0].temperature, 45.0);
    }

    #[test]
    fn test_reading_cap_evicts_oldest() {
        let mut session = FireAlertSession::open(&reading(40.0, 0), false);
        for i in 1..5 {
            session.extend(&reading(40.0 + i as f64, i * 30), 3);
        }

        assert_eq!(session.readings.len(), 3);
        assert_eq!(session.readings[0].temperature, 44.0);
        // Average is over the retained window only
        assert_eq!(session.avg_temp, 43.0);
        // Extrema keep the evicted peak
        assert_eq!(session.min_temp, 40.0);
    }

    #[test]
    fn test_close_sets_end_time() {
        let mut session = FireAlertSession::open(&reading(41.0, 0), false);
        let end = reading(22.0, 90).timestamp;
        session.close(end);

        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.end_time, Some(end));
        assert!(session.end_time.unwrap() >= session.start_time);
    }
}
