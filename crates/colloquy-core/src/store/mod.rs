//! ConversationStore trait definition.
//!
//! Persistence port for sessions and messages. Implementations live in
//! colloquy-infra (e.g. `SqliteConversationStore`). Uses native async fn in
//! traits (RPITIT, Rust 2024 edition).

pub mod service;

use colloquy_types::error::PersistenceError;
use colloquy_types::message::{AttachmentRef, Message};
use colloquy_types::session::Session;
use uuid::Uuid;

/// Repository trait for session and message persistence.
///
/// Every mutating call commits durably before returning; a failed call
/// guarantees nothing was written. Sequence assignment for `append_message`
/// is serialized per store: two concurrent appends on one session can never
/// observe the same sequence value.
pub trait ConversationStore: Send + Sync {
    /// Create a new session for an owner; persists immediately.
    fn create_session(
        &self,
        owner_key: &str,
        title: Option<String>,
    ) -> impl std::future::Future<Output = Result<Session, PersistenceError>> + Send;

    /// Get a session by its unique id.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Session>, PersistenceError>> + Send;

    /// List an owner's sessions, newest first.
    fn list_sessions(
        &self,
        owner_key: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Session>, PersistenceError>> + Send;

    /// Set the session title (first-user-message titling).
    fn update_session_title(
        &self,
        session_id: &Uuid,
        title: &str,
    ) -> impl std::future::Future<Output = Result<(), PersistenceError>> + Send;

    /// Append a message with the next dense sequence number for the
    /// session (1 when none exist). Sequence assignment and row
    /// persistence are one atomic step.
    fn append_message(
        &self,
        session_id: &Uuid,
        content: &str,
        is_from_user: bool,
        attachment_refs: &[AttachmentRef],
    ) -> impl std::future::Future<Output = Result<Message, PersistenceError>> + Send;

    /// Messages of a session in ascending sequence order.
    fn list_messages(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, PersistenceError>> + Send;

    /// Replace the content of an existing message (explicit edit).
    fn update_message_content(
        &self,
        session_id: &Uuid,
        sequence: i64,
        content: &str,
    ) -> impl std::future::Future<Output = Result<(), PersistenceError>> + Send;

    /// Delete a session and, via cascade, all of its messages.
    fn delete_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), PersistenceError>> + Send;
}
