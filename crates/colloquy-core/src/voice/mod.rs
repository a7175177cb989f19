//! Hands-free voice conversation loop.
//!
//! Platform audio capture, speech recognition, and speech synthesis stay
//! outside this crate; they plug in through the traits in [`io`]. The
//! engine itself is an actor owning all conversation state.

pub mod engine;
pub mod io;
pub mod waveform;

pub use engine::{VoiceEngine, VoiceExchange, VoicePhase, VoiceSettings, VoiceSnapshot};
pub use io::{CaptureControl, CaptureEvent, SpeechSynthesizer};
pub use waveform::WaveformBuffer;
