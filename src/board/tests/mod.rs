//! Unit tests for the board module.
//!
//! Covers task construction and editing, derived views, and the workflow
//! engine's move protocol including its interaction with the live timer.
