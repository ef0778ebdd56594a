// Search index representation of a note, plus the scheduler wiring
// that keeps the index converging with the note store.

use serde::{Deserialize, Serialize};

use notarium_common::diff::normalize::comparable_text;
use notarium_common::types::NoteSnapshot;

use crate::coalesce::{CoalescingScheduler, Keyed};
use crate::dedup::DedupScheduler;

/// What the remote search index stores per note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub note_id: String,
    pub title: String,
    pub content: String,
}

impl SearchDocument {
    /// Index the same text the diff engine compares: canonical source
    /// when present, stripped markup otherwise.
    pub fn from_snapshot(snapshot: &NoteSnapshot) -> Self {
        Self {
            note_id: snapshot.id.clone(),
            title: snapshot.title.clone(),
            content: comparable_text(snapshot),
        }
    }
}

impl Keyed for SearchDocument {
    fn key(&self) -> &str {
        &self.note_id
    }
}

/// Pushes note documents to the search index, coalesced per note.
pub type SearchSyncScheduler<S> = CoalescingScheduler<SearchDocument, S>;

/// Removes note documents from the search index, deduped per note.
pub type SearchDeleteScheduler<S> = DedupScheduler<S>;
