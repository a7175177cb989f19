//! Collaborator ports for the voice loop.
//!
//! Implementations wrap whatever microphone, speech-recognition, and
//! text-to-speech facilities the platform offers. The engine only sees
//! these traits and the [`CaptureEvent`] channel.

use colloquy_types::error::VoiceError;

/// One observation from the capture pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// Normalized input level in `0.0..=1.0` for one audio frame.
    Level(f32),
    /// Rolling transcript of the utterance so far; each event replaces the
    /// previous one.
    Transcript(String),
}

/// Control surface of the audio capture + recognition pipeline.
///
/// Events flow on a separate mpsc channel handed to the engine at spawn
/// time. Pause keeps the pipeline warm (no events are expected while
/// paused); stop tears it down.
pub trait CaptureControl: Send + 'static {
    fn start(&self) -> impl std::future::Future<Output = Result<(), VoiceError>> + Send;

    fn pause(&self) -> impl std::future::Future<Output = Result<(), VoiceError>> + Send;

    fn resume(&self) -> impl std::future::Future<Output = Result<(), VoiceError>> + Send;

    fn stop(&self) -> impl std::future::Future<Output = Result<(), VoiceError>> + Send;
}

/// Text-to-speech playback.
pub trait SpeechSynthesizer: Send + Sync + 'static {
    /// Speak `text`; the future resolves when playback finishes.
    fn speak(&self, text: String)
    -> impl std::future::Future<Output = Result<(), VoiceError>> + Send;

    /// Cut playback short. Any pending `speak` future resolves promptly.
    fn stop(&self);
}
