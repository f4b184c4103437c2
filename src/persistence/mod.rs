//! Key-value persistence for the work-tracking engine.
//!
//! Every component writes through to a [`ports::KeyValueStore`] immediately
//! after each committed transition. Values are JSON documents stored under
//! string keys so the persisted shape matches the dashboard's local storage.
//!
//! - Port contract in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod ports;

#[cfg(test)]
mod tests;
