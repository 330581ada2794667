//! Reading ingestion and duplicate suppression.
//!
//! The alerts endpoint returns a full snapshot on every poll, so an
//! unchanged device shows up again with identical channel values. The
//! duplicate filter suppresses those before they reach the session
//! tracker.

pub mod types;

pub use types::{RawReading, SensorReading};

use std::collections::VecDeque;

/// Two readings are duplicates iff they come from the same device with
/// equal timestamp and channel values. The retained window is shared
/// across devices, so device identity is part of the comparison.
pub fn is_duplicate(candidate: &SensorReading, history: &[SensorReading]) -> bool {
    history.iter().any(|r| {
        r.device_id == candidate.device_id
            && r.timestamp == candidate.timestamp
            && r.temperature == candidate.temperature
            && r.humidity == candidate.humidity
            && r.smoke == candidate.smoke
    })
}

/// Bounded most-recent-first window of accepted readings.
#[derive(Debug)]
pub struct ReadingHistory {
    readings: VecDeque<SensorReading>,
    cap: usize,
}

impl ReadingHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            readings: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Accept the reading unless the retained window already holds an
    /// identical one. Returns whether it was accepted.
    pub fn push_if_new(&mut self, reading: SensorReading) -> bool {
        let (a, b) = self.readings.as_slices();
        if is_duplicate(&reading, a) || is_duplicate(&reading, b) {
            return false;
        }

        self.readings.push_front(reading);
        self.readings.truncate(self.cap);
        true
    }

    /// Retained readings, most recent first.
    pub fn readings(&self) -> impl Iterator<Item = &SensorReading> {
        self.readings.iter()
    }

    pub fn to_vec(&self) -> Vec<SensorReading> {
        self.readings.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn reading(device: &str, offset_secs: i64, temp: f64) -> SensorReading {
        SensorReading {
            id: format!("{device}-{offset_secs}"),
            device_id: device.to_string(),
            latitude: 46.0,
            longitude: 23.0,
            humidity: 40.0,
            temperature: temp,
            smoke: 10.0,
            is_fire: false,
            timestamp: Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
                + chrono::Duration::seconds(offset_secs),
        }
    }

    #[test]
    fn test_duplicate_detection() {
        let first = reading("DEV-1", 0, 22.0);
        let same = reading("DEV-1", 0, 22.0);
        let later = reading("DEV-1", 30, 22.0);

        assert!(is_duplicate(&same, &[first.clone()]));
        assert!(!is_duplicate(&later, &[first]));
    }

    #[test]
    fn test_channel_change_is_not_duplicate() {
        let first = reading("DEV-1", 0, 22.0);
        let hotter = reading("DEV-1", 0, 23.0);

        assert!(!is_duplicate(&hotter, &[first]));
    }

    #[test]
    fn test_identical_snapshot_from_other_device_accepted() {
        // Two devices can legitimately report the same timestamp and
        // channel values in one batch; neither may shadow the other.
        let mut history = ReadingHistory::new(10);
        let first = reading("DEV-1", 0, 22.0);
        let mut second = reading("DEV-2", 0, 22.0);
        second.is_fire = true;

        assert!(history.push_if_new(first));
        assert!(history.push_if_new(second));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_push_if_new_suppresses_repeat() {
        let mut history = ReadingHistory::new(10);

        assert!(history.push_if_new(reading("DEV-1", 0, 22.0)));
        assert!(!history.push_if_new(reading("DEV-1", 0, 22.0)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_history_cap_and_order() {
        let mut history = ReadingHistory::new(3);
        for i in 0..5 {
            assert!(history.push_if_new(reading("DEV-1", i, 20.0 + i as f64)));
        }

        assert_eq!(history.len(), 3);
        // Most recent first
        let temps: Vec<f64> = history.readings().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![24.0, 23.0, 22.0]);
    }
}
