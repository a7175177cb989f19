//! Progressive reveal of assistant replies.

pub mod typewriter;

pub use typewriter::{RenderEvent, RenderHandle, RenderState, Typewriter};
