//! Message and attachment reference types.
//!
//! Messages are ordered within a session by a dense `sequence` counter
//! starting at 1. Attachment references are relative paths into the
//! attachment vault, never absolute paths (the vault root may move between
//! launches).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Kind of a stored attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    File,
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentKind::Image => write!(f, "image"),
            AttachmentKind::File => write!(f, "file"),
        }
    }
}

impl FromStr for AttachmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(AttachmentKind::Image),
            "file" => Ok(AttachmentKind::File),
            other => Err(format!("invalid attachment kind: '{other}'")),
        }
    }
}

/// Stable reference to vault-stored binary content.
///
/// `path` is relative to the vault root and is never reused after deletion
/// (file names embed a fresh UUID).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub path: String,
    pub kind: AttachmentKind,
}

/// A single message within a chat session.
///
/// Identified by `(session_id, sequence)`; `sequence` values are dense in
/// insertion order with no gaps and no duplicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub session_id: Uuid,
    pub sequence: i64,
    /// May be empty for attachments-only turns.
    pub content: String,
    pub is_from_user: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub attachment_refs: Vec<AttachmentRef>,
}
