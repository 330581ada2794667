//! Core session tracking: the per-device state machine and its
//! durable store.

pub mod session;
pub mod store;
pub mod tracker;

pub use session::{FireAlertSession, SessionStatus};
pub use store::{SessionStore, StoreError};
pub use tracker::{SessionTracker, SessionTransition};
