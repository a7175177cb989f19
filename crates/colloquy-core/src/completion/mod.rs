//! CompletionService trait definition.
//!
//! Port for the remote completion endpoint. Implementations live in
//! colloquy-infra (`HttpCompletionClient`).

use colloquy_types::error::RequestError;

/// One user turn bound for the completion endpoint.
#[derive(Debug, Clone, Default)]
pub struct CompletionTurn {
    pub text: String,
    /// Raw image bytes, re-encoded by the implementation for the
    /// multimodal request variant.
    pub images: Vec<Vec<u8>>,
    /// True when the turn carried any attachment, image or not. Selects
    /// the multimodal variant even when no image bytes made it onto the
    /// wire (e.g. a file-only turn).
    pub has_attachments: bool,
}

impl CompletionTurn {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// A turn is empty when it has neither text nor attachments. Empty
    /// text alone is a valid turn as long as an attachment is present.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && !self.has_attachments
    }
}

/// Client for the remote completion endpoint.
///
/// At most one request is in flight per client instance: starting a new
/// `send` cancels any unresolved one. A cancelled or superseded request
/// resolves `Ok(None)` -- silenced, never reported as success or failure.
/// `Ok(Some(answer))` is the decoded reply text.
pub trait CompletionService: Send + Sync {
    /// Send one user turn. An empty turn (no text, no attachments) is
    /// rejected with `RequestError::EmptyTurn`.
    fn send(
        &self,
        turn: CompletionTurn,
    ) -> impl std::future::Future<Output = Result<Option<String>, RequestError>> + Send;

    /// Cancel any in-flight request. Idempotent; a no-op with nothing in
    /// flight.
    fn cancel(&self);
}
