//! Conversation service orchestrating the turn pipeline.
//!
//! `ConversationService` coordinates the store, vault, and completion
//! client for a full turn: persist the user message, title the session from
//! its first user message, re-encode image attachments, dispatch the
//! request, persist the reply. Generic over the three ports so core never
//! depends on infra.

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use colloquy_types::error::{PersistenceError, RequestError, StorageError};
use colloquy_types::message::{AttachmentKind, AttachmentRef, Message};
use colloquy_types::session::Session;

use crate::completion::{CompletionService, CompletionTurn};
use crate::store::ConversationStore;
use crate::vault::AttachmentVault;

/// Longest auto-derived session title, in characters.
const MAX_TITLE_CHARS: usize = 64;

/// Failures surfaced by `submit_turn`.
///
/// A request failure leaves the user message persisted so the caller can
/// offer a retry; a persistence failure means nothing of the turn exists.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Result of one submitted turn.
///
/// `assistant` is `None` when the request was superseded by a newer turn
/// (the silenced-cancellation path): the user message exists, no reply was
/// recorded, and nothing is reported to the caller.
#[derive(Debug)]
pub struct TurnOutcome {
    pub user: Message,
    pub assistant: Option<Message>,
}

/// Orchestrates the store, vault, and completion client for chat turns.
pub struct ConversationService<S, V, C> {
    store: S,
    vault: V,
    client: C,
}

impl<S, V, C> ConversationService<S, V, C>
where
    S: ConversationStore,
    V: AttachmentVault,
    C: CompletionService,
{
    pub fn new(store: S, vault: V, client: C) -> Self {
        Self {
            store,
            vault,
            client,
        }
    }

    /// Access the conversation store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Access the attachment vault.
    pub fn vault(&self) -> &V {
        &self.vault
    }

    /// Access the completion client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Create a session, optionally with an explicit title.
    pub async fn create_session(
        &self,
        owner_key: &str,
        title: Option<String>,
    ) -> Result<Session, PersistenceError> {
        let session = self.store.create_session(owner_key, title).await?;
        info!(session_id = %session.id, "session created");
        Ok(session)
    }

    /// Store picked attachment bytes in the vault.
    pub async fn store_attachment(
        &self,
        bytes: &[u8],
        suggested_extension: &str,
    ) -> Result<AttachmentRef, StorageError> {
        self.vault.store(bytes, suggested_extension).await
    }

    /// Submit one user turn: persist it, dispatch the completion request,
    /// persist and return the reply.
    ///
    /// Attachment refs that fail to resolve are dropped from the request
    /// with a warning; the rest of the turn proceeds. Only image
    /// attachments travel on the wire, but any attachment (file or image)
    /// selects the multimodal request variant, and a turn with empty text
    /// is valid as long as it carries an attachment.
    pub async fn submit_turn(
        &self,
        session_id: &Uuid,
        text: &str,
        attachment_refs: Vec<AttachmentRef>,
    ) -> Result<TurnOutcome, TurnError> {
        let user = self
            .store
            .append_message(session_id, text, true, &attachment_refs)
            .await?;

        self.title_from_first_message(session_id, &user).await?;

        let mut images = Vec::new();
        for reference in attachment_refs
            .iter()
            .filter(|r| r.kind == AttachmentKind::Image)
        {
            match self.vault.resolve(reference).await {
                Ok(bytes) => images.push(bytes),
                Err(err) => {
                    warn!(path = %reference.path, %err, "dropping unresolvable attachment from turn");
                }
            }
        }

        let turn = CompletionTurn {
            text: text.to_string(),
            images,
            has_attachments: !attachment_refs.is_empty(),
        };
        match self.client.send(turn).await? {
            Some(answer) => {
                let assistant = self
                    .store
                    .append_message(session_id, &answer, false, &[])
                    .await?;
                Ok(TurnOutcome {
                    user,
                    assistant: Some(assistant),
                })
            }
            None => {
                info!(session_id = %session_id, "turn superseded, no reply recorded");
                Ok(TurnOutcome {
                    user,
                    assistant: None,
                })
            }
        }
    }

    /// Delete a session, its messages, and (best-effort) the attachment
    /// files those messages referenced.
    pub async fn delete_session(&self, session_id: &Uuid) -> Result<(), PersistenceError> {
        let refs: Vec<AttachmentRef> = self
            .store
            .list_messages(session_id)
            .await?
            .into_iter()
            .flat_map(|m| m.attachment_refs)
            .collect();

        self.store.delete_session(session_id).await?;
        info!(session_id = %session_id, "session deleted");

        for reference in refs {
            if let Err(err) = self.vault.delete(&reference).await {
                warn!(path = %reference.path, %err, "orphaned attachment not removed");
            }
        }
        Ok(())
    }

    /// Title an untitled session from its first user message.
    async fn title_from_first_message(
        &self,
        session_id: &Uuid,
        user: &Message,
    ) -> Result<(), PersistenceError> {
        if user.sequence != 1 {
            return Ok(());
        }
        let Some(session) = self.store.get_session(session_id).await? else {
            return Ok(());
        };
        if session.title.is_some() {
            return Ok(());
        }

        let title = derive_title(&user.content);
        if let Some(title) = title {
            self.store.update_session_title(session_id, &title).await?;
        }
        Ok(())
    }
}

/// Derive a session title from message text: first line, truncated on a
/// char boundary. Returns `None` for whitespace-only text (attachments-only
/// turns stay untitled until a textual one arrives).
fn derive_title(text: &str) -> Option<String> {
    let line = text.trim().lines().next()?.trim();
    if line.is_empty() {
        return None;
    }
    Some(line.chars().take(MAX_TITLE_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;

    #[test]
    fn test_derive_title_first_line() {
        let title = derive_title("What is Rust?\nAnd why?").unwrap();
        assert_eq!(title, "What is Rust?");
    }

    #[test]
    fn test_derive_title_truncates_on_char_boundary() {
        let text = "\u{00e9}".repeat(100);
        let title = derive_title(&text).unwrap();
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn test_derive_title_empty_text() {
        assert!(derive_title("   \n  ").is_none());
        assert!(derive_title("").is_none());
    }

    #[derive(Default)]
    struct MemStore {
        sessions: Mutex<HashMap<Uuid, Session>>,
        messages: Mutex<HashMap<Uuid, Vec<Message>>>,
    }

    impl ConversationStore for MemStore {
        async fn create_session(
            &self,
            owner_key: &str,
            title: Option<String>,
        ) -> Result<Session, PersistenceError> {
            let session = Session::new(owner_key, title);
            self.sessions
                .lock()
                .unwrap()
                .insert(session.id, session.clone());
            Ok(session)
        }

        async fn get_session(&self, session_id: &Uuid) -> Result<Option<Session>, PersistenceError> {
            Ok(self.sessions.lock().unwrap().get(session_id).cloned())
        }

        async fn list_sessions(&self, owner_key: &str) -> Result<Vec<Session>, PersistenceError> {
            let mut out: Vec<Session> = self
                .sessions
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.owner_key == owner_key)
                .cloned()
                .collect();
            out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(out)
        }

        async fn update_session_title(
            &self,
            session_id: &Uuid,
            title: &str,
        ) -> Result<(), PersistenceError> {
            let mut sessions = self.sessions.lock().unwrap();
            let session = sessions
                .get_mut(session_id)
                .ok_or(PersistenceError::SessionNotFound)?;
            session.title = Some(title.to_string());
            Ok(())
        }

        async fn append_message(
            &self,
            session_id: &Uuid,
            content: &str,
            is_from_user: bool,
            attachment_refs: &[AttachmentRef],
        ) -> Result<Message, PersistenceError> {
            if !self.sessions.lock().unwrap().contains_key(session_id) {
                return Err(PersistenceError::SessionNotFound);
            }
            let mut messages = self.messages.lock().unwrap();
            let list = messages.entry(*session_id).or_default();
            let message = Message {
                session_id: *session_id,
                sequence: list.len() as i64 + 1,
                content: content.to_string(),
                is_from_user,
                created_at: Utc::now(),
                attachment_refs: attachment_refs.to_vec(),
            };
            list.push(message.clone());
            Ok(message)
        }

        async fn list_messages(&self, session_id: &Uuid) -> Result<Vec<Message>, PersistenceError> {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .get(session_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn update_message_content(
            &self,
            session_id: &Uuid,
            sequence: i64,
            content: &str,
        ) -> Result<(), PersistenceError> {
            let mut messages = self.messages.lock().unwrap();
            let list = messages
                .get_mut(session_id)
                .ok_or(PersistenceError::MessageNotFound)?;
            let message = list
                .iter_mut()
                .find(|m| m.sequence == sequence)
                .ok_or(PersistenceError::MessageNotFound)?;
            message.content = content.to_string();
            Ok(())
        }

        async fn delete_session(&self, session_id: &Uuid) -> Result<(), PersistenceError> {
            self.sessions
                .lock()
                .unwrap()
                .remove(session_id)
                .ok_or(PersistenceError::SessionNotFound)?;
            self.messages.lock().unwrap().remove(session_id);
            Ok(())
        }
    }

    /// Vault fake where every path containing "missing" fails to resolve.
    #[derive(Default)]
    struct MemVault {
        deleted: Mutex<Vec<String>>,
    }

    impl AttachmentVault for MemVault {
        async fn store(
            &self,
            _bytes: &[u8],
            suggested_extension: &str,
        ) -> Result<AttachmentRef, StorageError> {
            Ok(AttachmentRef {
                path: format!("attachments/test.{suggested_extension}"),
                kind: AttachmentKind::Image,
            })
        }

        async fn resolve(&self, reference: &AttachmentRef) -> Result<Vec<u8>, StorageError> {
            if reference.path.contains("missing") {
                return Err(StorageError::NotFound);
            }
            Ok(vec![1, 2, 3])
        }

        async fn delete(&self, reference: &AttachmentRef) -> Result<(), StorageError> {
            self.deleted.lock().unwrap().push(reference.path.clone());
            Ok(())
        }
    }

    enum Reply {
        Answer(String),
        Silenced,
        Fail,
    }

    struct FakeClient {
        reply: Reply,
        /// (image count, has_attachments) per observed send.
        seen: Mutex<Vec<(usize, bool)>>,
    }

    impl FakeClient {
        fn answering(text: &str) -> Self {
            Self {
                reply: Reply::Answer(text.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl CompletionService for FakeClient {
        async fn send(&self, turn: CompletionTurn) -> Result<Option<String>, RequestError> {
            if turn.is_empty() {
                return Err(RequestError::EmptyTurn);
            }
            self.seen
                .lock()
                .unwrap()
                .push((turn.images.len(), turn.has_attachments));
            match &self.reply {
                Reply::Answer(text) => Ok(Some(text.clone())),
                Reply::Silenced => Ok(None),
                Reply::Fail => Err(RequestError::Http("connection refused".into())),
            }
        }

        fn cancel(&self) {}
    }

    fn service(reply: Reply) -> ConversationService<MemStore, MemVault, FakeClient> {
        ConversationService::new(
            MemStore::default(),
            MemVault::default(),
            FakeClient {
                reply,
                seen: Mutex::new(Vec::new()),
            },
        )
    }

    #[tokio::test]
    async fn test_submit_turn_persists_both_messages() {
        let svc = service(Reply::Answer("hello back".into()));
        let session = svc.create_session("local", None).await.unwrap();

        let outcome = svc.submit_turn(&session.id, "hello", vec![]).await.unwrap();
        assert_eq!(outcome.user.sequence, 1);
        assert!(outcome.user.is_from_user);
        let assistant = outcome.assistant.unwrap();
        assert_eq!(assistant.sequence, 2);
        assert_eq!(assistant.content, "hello back");
        assert!(!assistant.is_from_user);
    }

    #[tokio::test]
    async fn test_first_turn_titles_untitled_session() {
        let svc = service(Reply::Answer("ok".into()));
        let session = svc.create_session("local", None).await.unwrap();

        svc.submit_turn(&session.id, "Explain lifetimes\nplease", vec![])
            .await
            .unwrap();

        let session = svc.store().get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(session.title.as_deref(), Some("Explain lifetimes"));
    }

    #[tokio::test]
    async fn test_explicit_title_not_overwritten() {
        let svc = service(Reply::Answer("ok".into()));
        let session = svc
            .create_session("local", Some("Kept".into()))
            .await
            .unwrap();

        svc.submit_turn(&session.id, "first message", vec![])
            .await
            .unwrap();

        let session = svc.store().get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(session.title.as_deref(), Some("Kept"));
    }

    #[tokio::test]
    async fn test_silenced_turn_keeps_user_message_only() {
        let svc = service(Reply::Silenced);
        let session = svc.create_session("local", None).await.unwrap();

        let outcome = svc.submit_turn(&session.id, "hello", vec![]).await.unwrap();
        assert!(outcome.assistant.is_none());

        let messages = svc.store().list_messages(&session.id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_from_user);
    }

    #[tokio::test]
    async fn test_request_failure_keeps_user_message() {
        let svc = service(Reply::Fail);
        let session = svc.create_session("local", None).await.unwrap();

        let err = svc
            .submit_turn(&session.id, "hello", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::Request(_)));

        let messages = svc.store().list_messages(&session.id).await.unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn test_unresolvable_attachment_dropped_from_request() {
        let svc = ConversationService::new(
            MemStore::default(),
            MemVault::default(),
            FakeClient::answering("ok"),
        );
        let session = svc.create_session("local", None).await.unwrap();

        let refs = vec![
            AttachmentRef {
                path: "attachments/good.png".into(),
                kind: AttachmentKind::Image,
            },
            AttachmentRef {
                path: "attachments/missing.png".into(),
                kind: AttachmentKind::Image,
            },
            AttachmentRef {
                path: "attachments/notes.txt".into(),
                kind: AttachmentKind::File,
            },
        ];
        svc.submit_turn(&session.id, "look at this", refs)
            .await
            .unwrap();

        // Only the resolvable image made it onto the wire.
        assert_eq!(*svc.client().seen.lock().unwrap(), vec![(1, true)]);
    }

    #[tokio::test]
    async fn test_file_only_attachment_with_empty_text_is_sent() {
        let svc = ConversationService::new(
            MemStore::default(),
            MemVault::default(),
            FakeClient::answering("received"),
        );
        let session = svc.create_session("local", None).await.unwrap();

        let refs = vec![AttachmentRef {
            path: "attachments/notes.txt".into(),
            kind: AttachmentKind::File,
        }];
        let outcome = svc.submit_turn(&session.id, "", refs).await.unwrap();
        assert_eq!(outcome.assistant.unwrap().content, "received");

        // No image bytes, but the turn still reports its attachment so it
        // is not rejected as empty.
        assert_eq!(*svc.client().seen.lock().unwrap(), vec![(0, true)]);
    }

    #[tokio::test]
    async fn test_delete_session_removes_attachments() {
        let svc = service(Reply::Answer("ok".into()));
        let session = svc.create_session("local", None).await.unwrap();

        let refs = vec![AttachmentRef {
            path: "attachments/pic.png".into(),
            kind: AttachmentKind::Image,
        }];
        svc.submit_turn(&session.id, "with image", refs).await.unwrap();

        svc.delete_session(&session.id).await.unwrap();
        assert!(svc.store().get_session(&session.id).await.unwrap().is_none());
        assert_eq!(
            *svc.vault().deleted.lock().unwrap(),
            vec!["attachments/pic.png".to_string()]
        );
    }
}
