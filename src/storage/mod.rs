//! Durable storage for settings and the latest usage snapshot.

pub mod paths;
pub mod state;

pub use state::{PersistedState, StateStore};
