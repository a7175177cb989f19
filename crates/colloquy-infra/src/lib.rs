//! Infrastructure implementations of the colloquy-core ports.
//!
//! SQLite-backed conversation store, filesystem attachment vault, and the
//! HTTP completion client, plus config file loading.

pub mod completion;
pub mod config;
pub mod sqlite;
pub mod vault;
