use thiserror::Error;

/// Errors from the conversation store (sessions/messages persistence).
///
/// A failed mutating call guarantees nothing was written: either the row
/// exists with its correct sequence, or it does not exist at all.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("session not found")]
    SessionNotFound,

    #[error("message not found")]
    MessageNotFound,
}

/// Errors from the attachment vault.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("attachment I/O error: {0}")]
    Io(String),

    #[error("attachment not found")]
    NotFound,

    #[error("invalid attachment reference: {0}")]
    InvalidRef(String),
}

/// Errors from the completion client.
///
/// Cancellation is deliberately not a variant: a cancelled or superseded
/// request is silenced, not reported.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("a turn needs text or at least one attachment")]
    EmptyTurn,

    #[error("request failed: {0}")]
    Http(String),

    #[error("endpoint returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Non-fatal failures inside the voice conversation loop, surfaced to the
/// UI as a status message.
#[derive(Debug, Error)]
#[error("voice error: {0}")]
pub struct VoiceError(pub String);
