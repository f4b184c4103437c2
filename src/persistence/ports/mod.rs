//! Port contracts for key-value persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by engine services.

pub mod store;

pub use store::{KeyValueStore, PersistenceError, PersistenceResult, load_json, save_json};
