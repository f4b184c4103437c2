//! Unit tests for the key-value store port and its adapters.
