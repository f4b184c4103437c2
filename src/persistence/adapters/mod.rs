//! Adapter implementations for the key-value persistence port.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::InMemoryStore;
