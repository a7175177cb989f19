//! Shared domain types for Colloquy.
//!
//! This crate contains the core domain types used across the Colloquy client:
//! Session, Message, AttachmentRef, wire content parts, and the error
//! taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod completion;
pub mod config;
pub mod error;
pub mod message;
pub mod session;
