//! The per-device session state machine.
//!
//! Consumes the deduplicated reading stream plus the completed
//! prediction issued for each reading and produces open/extend/close
//! transitions. A device is tracked while `reading.is_fire` OR the
//! reading's own prediction confirms fire risk: a reading whose fire
//! flag has dropped can still extend the session while the model keeps
//! confirming risk, and a reading with neither signal closes it.

use crate::core::session::FireAlertSession;
use crate::core::store::SessionStore;
use crate::predict::MlPrediction;
use crate::reading::SensorReading;
use std::collections::HashMap;

/// Outcome of observing one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTransition {
    /// A new session was opened for the device
    Opened,
    /// The device's active session absorbed the reading
    Extended,
    /// The device's active session was closed and persisted
    Closed,
    /// Nothing to do: no fire signal and no active session
    Idle,
}

/// Tracks at most one active session per device and a bounded history
/// of completed sessions backed by the durable store.
pub struct SessionTracker {
    active: HashMap<String, FireAlertSession>,
    completed: Vec<FireAlertSession>,
    store: SessionStore,
    reading_cap: usize,
    prediction_cap: usize,
}

impl SessionTracker {
    /// Create a tracker, reloading the completed history from the store.
    ///
    /// A store failure degrades to an empty history; tracking itself
    /// must keep working without durability.
    pub fn new(store: SessionStore, reading_cap: usize, prediction_cap: usize) -> Self {
        let completed = match store.load() {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!(error = %e, "could not load persisted sessions, starting empty");
                Vec::new()
            }
        };

        Self {
            active: HashMap::new(),
            completed,
            store,
            reading_cap: reading_cap.max(1),
            prediction_cap: prediction_cap.max(1),
        }
    }

    /// Apply one newly accepted (non-duplicate) reading.
    ///
    /// `prediction` is the completed prediction issued for this
    /// reading, if any.
    pub fn observe(
        &mut self,
        reading: &SensorReading,
        prediction: Option<&MlPrediction>,
    ) -> SessionTransition {
        let ml_risk = prediction.map(|p| p.indicates_fire_risk()).unwrap_or(false);
        let should_track = reading.is_fire || ml_risk;

        match (should_track, self.active.get_mut(&reading.device_id)) {
            (true, None) => {
                let mut session = FireAlertSession::open(reading, ml_risk);
                if let Some(p) = prediction {
                    session.correlate_prediction(p, self.prediction_cap);
                }
                tracing::info!(device = %reading.device_id, session = %session.id, "session opened");
                self.active.insert(reading.device_id.clone(), session);
                SessionTransition::Opened
            }
            (true, Some(session)) => {
                session.extend(reading, self.reading_cap);
                if let Some(p) = prediction {
                    session.correlate_prediction(p, self.prediction_cap);
                }
                SessionTransition::Extended
            }
            (false, Some(_)) => {
                // Remove before persisting; the session must leave the
                // active set even when the save below fails.
                let mut session = self
                    .active
                    .remove(&reading.device_id)
                    .expect("active session checked above");
                session.close(reading.timestamp);
                tracing::info!(device = %reading.device_id, session = %session.id, "session closed");

                self.completed.insert(0, session);
                self.completed.truncate(self.store.cap());

                if let Err(e) = self.store.save(&self.completed) {
                    tracing::warn!(error = %e, "could not persist sessions, continuing in memory");
                }

                SessionTransition::Closed
            }
            (false, None) => SessionTransition::Idle,
        }
    }

    /// Active session for one device, if any.
    pub fn active_for(&self, device_id: &str) -> Option<&FireAlertSession> {
        self.active.get(device_id)
    }

    /// All active sessions.
    pub fn active_sessions(&self) -> Vec<FireAlertSession> {
        self.active.values().cloned().collect()
    }

    /// Completed sessions, most recent first.
    pub fn completed_sessions(&self) -> &[FireAlertSession] {
        &self.completed
    }
}
