// Core domain types shared across the Notarium workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable point-in-time copy of a note's fields, captured around an
/// agent-proposed edit. The diff engine never retains one past a single call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteSnapshot {
    pub id: String,
    pub title: String,
    /// Rendered rich-text markup; opaque except for generic tag stripping.
    pub content: String,
    /// Canonical markdown source, when the editor kept one.
    pub markdown_source: Option<String>,
}

impl NoteSnapshot {
    /// Field-wise inequality check used to skip no-op approval flows.
    /// A missing markdown source compares equal to an empty one.
    pub fn differs_from(&self, other: &NoteSnapshot) -> bool {
        self.title != other.title
            || self.content != other.content
            || self.markdown_source.as_deref().unwrap_or("")
                != other.markdown_source.as_deref().unwrap_or("")
    }
}

/// The authoritative current record for a note, as returned by the
/// latest-record probe. Storage owns the full schema; this is the slice
/// the reconciliation layer needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteRecord {
    pub id: String,
    pub title: String,
    /// Plain text the store derives from the rendered content.
    pub plain_text: String,
    pub is_deleted: bool,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Default emptiness predicate: no visible title and no visible text.
pub fn note_is_empty(record: &NoteRecord) -> bool {
    record.title.trim().is_empty() && record.plain_text.trim().is_empty()
}
