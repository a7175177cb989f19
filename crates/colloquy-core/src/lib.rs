//! Domain logic and trait definitions for Colloquy.
//!
//! This crate defines the "ports" (store, vault, completion client) that the
//! infrastructure layer implements, plus the two pieces of pure runtime
//! machinery: the typewriter reveal and the voice conversation engine. It
//! depends only on `colloquy-types` -- never on `colloquy-infra` or any
//! database/HTTP crate.

pub mod completion;
pub mod render;
pub mod store;
pub mod vault;
pub mod voice;
