//! SQLite conversation store.
//!
//! Implements `ConversationStore` from colloquy-core using sqlx with the
//! split read/write pools: raw queries, private Row structs mapping SQLite
//! rows to domain types.
//!
//! Sequence assignment happens inside the INSERT itself
//! (`COALESCE(MAX(sequence), 0) + 1` subselect with RETURNING). The writer
//! pool holds a single connection, so two appends to the same session can
//! never observe the same MAX and the per-session sequence is gapless.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use colloquy_core::store::ConversationStore;
use colloquy_types::error::PersistenceError;
use colloquy_types::message::{AttachmentRef, Message};
use colloquy_types::session::Session;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ConversationStore`.
pub struct SqliteConversationStore {
    pool: DatabasePool,
}

impl SqliteConversationStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct SessionRow {
    id: String,
    owner_key: String,
    title: Option<String>,
    created_at: String,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_key: row.try_get("owner_key")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_session(self) -> Result<Session, PersistenceError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| PersistenceError::Query(format!("invalid session id: {e}")))?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(Session {
            id,
            owner_key: self.owner_key,
            title: self.title,
            created_at,
        })
    }
}

struct MessageRow {
    session_id: String,
    sequence: i64,
    content: String,
    is_from_user: i64,
    created_at: String,
    attachment_refs: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            session_id: row.try_get("session_id")?,
            sequence: row.try_get("sequence")?,
            content: row.try_get("content")?,
            is_from_user: row.try_get("is_from_user")?,
            created_at: row.try_get("created_at")?,
            attachment_refs: row.try_get("attachment_refs")?,
        })
    }

    fn into_message(self) -> Result<Message, PersistenceError> {
        let session_id = Uuid::parse_str(&self.session_id)
            .map_err(|e| PersistenceError::Query(format!("invalid session_id: {e}")))?;
        let created_at = parse_datetime(&self.created_at)?;
        let attachment_refs: Vec<AttachmentRef> = serde_json::from_str(&self.attachment_refs)
            .map_err(|e| PersistenceError::Query(format!("invalid attachment refs: {e}")))?;

        Ok(Message {
            session_id,
            sequence: self.sequence,
            content: self.content,
            is_from_user: self.is_from_user != 0,
            created_at,
            attachment_refs,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, PersistenceError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PersistenceError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn map_query_error(e: sqlx::Error) -> PersistenceError {
    let text = e.to_string();
    if text.contains("FOREIGN KEY constraint failed") {
        return PersistenceError::SessionNotFound;
    }
    PersistenceError::Query(text)
}

// ---------------------------------------------------------------------------
// ConversationStore implementation
// ---------------------------------------------------------------------------

impl ConversationStore for SqliteConversationStore {
    async fn create_session(
        &self,
        owner_key: &str,
        title: Option<String>,
    ) -> Result<Session, PersistenceError> {
        let session = Session::new(owner_key, title);

        sqlx::query(
            "INSERT INTO sessions (id, owner_key, title, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(session.id.to_string())
        .bind(&session.owner_key)
        .bind(&session.title)
        .bind(format_datetime(&session.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(map_query_error)?;

        Ok(session)
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<Session>, PersistenceError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_query_error)?;

        match row {
            Some(row) => {
                let session_row = SessionRow::from_row(&row)
                    .map_err(|e| PersistenceError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn list_sessions(&self, owner_key: &str) -> Result<Vec<Session>, PersistenceError> {
        let rows =
            sqlx::query("SELECT * FROM sessions WHERE owner_key = ? ORDER BY created_at DESC")
                .bind(owner_key)
                .fetch_all(&self.pool.reader)
                .await
                .map_err(map_query_error)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row =
                SessionRow::from_row(row).map_err(|e| PersistenceError::Query(e.to_string()))?;
            sessions.push(session_row.into_session()?);
        }

        Ok(sessions)
    }

    async fn update_session_title(
        &self,
        session_id: &Uuid,
        title: &str,
    ) -> Result<(), PersistenceError> {
        let result = sqlx::query("UPDATE sessions SET title = ? WHERE id = ?")
            .bind(title)
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(map_query_error)?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::SessionNotFound);
        }

        Ok(())
    }

    async fn append_message(
        &self,
        session_id: &Uuid,
        content: &str,
        is_from_user: bool,
        attachment_refs: &[AttachmentRef],
    ) -> Result<Message, PersistenceError> {
        let created_at = Utc::now();
        let refs_json = serde_json::to_string(attachment_refs)
            .map_err(|e| PersistenceError::Query(format!("invalid attachment refs: {e}")))?;

        let row = sqlx::query(
            r#"INSERT INTO messages (session_id, sequence, content, is_from_user, created_at, attachment_refs)
               VALUES (?1, (SELECT COALESCE(MAX(sequence), 0) + 1 FROM messages WHERE session_id = ?1), ?2, ?3, ?4, ?5)
               RETURNING sequence"#,
        )
        .bind(session_id.to_string())
        .bind(content)
        .bind(is_from_user as i64)
        .bind(format_datetime(&created_at))
        .bind(&refs_json)
        .fetch_one(&self.pool.writer)
        .await
        .map_err(map_query_error)?;

        let sequence: i64 = row
            .try_get("sequence")
            .map_err(|e| PersistenceError::Query(e.to_string()))?;

        Ok(Message {
            session_id: *session_id,
            sequence,
            content: content.to_string(),
            is_from_user,
            created_at,
            attachment_refs: attachment_refs.to_vec(),
        })
    }

    async fn list_messages(&self, session_id: &Uuid) -> Result<Vec<Message>, PersistenceError> {
        let rows =
            sqlx::query("SELECT * FROM messages WHERE session_id = ? ORDER BY sequence ASC")
                .bind(session_id.to_string())
                .fetch_all(&self.pool.reader)
                .await
                .map_err(map_query_error)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let message_row =
                MessageRow::from_row(row).map_err(|e| PersistenceError::Query(e.to_string()))?;
            messages.push(message_row.into_message()?);
        }

        Ok(messages)
    }

    async fn update_message_content(
        &self,
        session_id: &Uuid,
        sequence: i64,
        content: &str,
    ) -> Result<(), PersistenceError> {
        let result =
            sqlx::query("UPDATE messages SET content = ? WHERE session_id = ? AND sequence = ?")
                .bind(content)
                .bind(session_id.to_string())
                .bind(sequence)
                .execute(&self.pool.writer)
                .await
                .map_err(map_query_error)?;

        // Covers both a missing session and a missing sequence.
        if result.rows_affected() == 0 {
            return Err(PersistenceError::MessageNotFound);
        }

        Ok(())
    }

    async fn delete_session(&self, session_id: &Uuid) -> Result<(), PersistenceError> {
        // Messages go with the session via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(map_query_error)?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::SessionNotFound);
        }

        Ok(())
    }
}
