//! Chat session type.
//!
//! A session groups the messages of one conversation and belongs to exactly
//! one owner (an opaque identity string, e.g. an account email).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chat session between the user and the assistant.
///
/// The `title` defaults to the first user message of the session and may be
/// absent until that message arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    /// Opaque owner identity (account email or a local placeholder).
    pub owner_key: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session with a fresh time-sortable id.
    pub fn new(owner_key: impl Into<String>, title: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner_key: owner_key.into(),
            title,
            created_at: Utc::now(),
        }
    }
}
