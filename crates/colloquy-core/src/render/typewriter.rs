//! Typewriter reveal for completed replies.
//!
//! The full answer arrives at once; the typewriter replays it one character
//! per tick so the reader sees it being "typed". Each tick carries the
//! current visible prefix, optionally passed through a formatter so partial
//! text can be styled before display. A reveal can be abandoned mid-flight
//! (the user navigated away or a newer reply arrived), which stops the task
//! without emitting the remainder.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Events emitted over the lifetime of one reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    /// The visible prefix grew by one character.
    Tick(String),
    /// The full text is visible.
    Done,
}

/// Observable progress of a reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Revealing,
    Done,
    Stopped,
}

/// Handle to an in-flight reveal.
pub struct RenderHandle {
    events: mpsc::Receiver<RenderEvent>,
    state: watch::Receiver<RenderState>,
    cancel: CancellationToken,
}

impl RenderHandle {
    /// Next reveal event, or `None` once the task has finished or been
    /// abandoned.
    pub async fn next_event(&mut self) -> Option<RenderEvent> {
        self.events.recv().await
    }

    /// Watch channel mirroring the reveal's progress.
    pub fn state(&self) -> watch::Receiver<RenderState> {
        self.state.clone()
    }

    /// Stop the reveal early. Idempotent; no further ticks are emitted.
    pub fn abandon(&self) {
        self.cancel.cancel();
    }
}

impl Drop for RenderHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawns reveal tasks at a fixed tick interval.
#[derive(Debug, Clone)]
pub struct Typewriter {
    tick: Duration,
}

impl Typewriter {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }

    /// Begin revealing `text`, one character per tick.
    ///
    /// Empty text completes immediately with zero ticks.
    pub fn render(&self, text: String) -> RenderHandle {
        self.render_with(text, |prefix| prefix.to_string())
    }

    /// Like [`render`](Self::render), but each emitted prefix is passed
    /// through `format` first.
    pub fn render_with<F>(&self, text: String, format: F) -> RenderHandle
    where
        F: Fn(&str) -> String + Send + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel(32);
        let (state_tx, state_rx) = watch::channel(RenderState::Idle);
        let cancel = CancellationToken::new();

        let tick = self.tick;
        let token = cancel.clone();
        tokio::spawn(async move {
            // Prefix lengths in bytes, one per character, so slicing stays
            // on char boundaries.
            let boundaries: Vec<usize> = text
                .char_indices()
                .map(|(i, c)| i + c.len_utf8())
                .collect();

            if boundaries.is_empty() {
                if token.is_cancelled() {
                    let _ = state_tx.send(RenderState::Stopped);
                    return;
                }
                let _ = state_tx.send(RenderState::Done);
                let _ = event_tx.send(RenderEvent::Done).await;
                return;
            }

            let _ = state_tx.send(RenderState::Revealing);
            let mut interval = tokio::time::interval(tick);

            for end in boundaries {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(shown = end, total = text.len(), "reveal abandoned");
                        let _ = state_tx.send(RenderState::Stopped);
                        return;
                    }
                    _ = interval.tick() => {}
                }
                let prefix = format(&text[..end]);
                if event_tx.send(RenderEvent::Tick(prefix)).await.is_err() {
                    let _ = state_tx.send(RenderState::Stopped);
                    return;
                }
            }

            // An abandon landing between the last tick and here must still
            // suppress Done.
            if token.is_cancelled() {
                let _ = state_tx.send(RenderState::Stopped);
                return;
            }
            let _ = state_tx.send(RenderState::Done);
            let _ = event_tx.send(RenderEvent::Done).await;
        });

        RenderHandle {
            events: event_rx,
            state: state_rx,
            cancel,
        }
    }
}
