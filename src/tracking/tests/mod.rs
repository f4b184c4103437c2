//! Unit tests for the tracking module.

mod timer_tests;
