//! HTTP completion client and its wire formats.

pub mod client;
pub mod wire;

pub use client::HttpCompletionClient;
