// Deferred empty-draft cleanup.
//
// When the editor navigates away from a note, the caller hands us a
// snapshot of what it just left. If the authoritative record still
// looks like an abandoned empty draft, we remove it. The active-note
// probe runs before and after the fetch so a user navigating back to
// the draft mid-cleanup keeps it.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use tracing::debug;

use notarium_common::types::{note_is_empty, NoteRecord};

use crate::guard::fetch_unless;

/// Authoritative note store the cleanup consults and mutates.
pub trait DraftStore: Send + Sync + 'static {
    /// Id of the note currently open in the editor, if any. Synchronous
    /// so it can be probed on both sides of the fetch.
    fn current_note_id(&self) -> Option<String>;

    /// Fetch the latest record for a note id.
    fn latest(&self, note_id: &str) -> impl Future<Output = Result<Option<NoteRecord>>> + Send;

    /// Whether a record counts as an abandoned empty draft.
    fn is_empty(&self, record: &NoteRecord) -> bool {
        note_is_empty(record)
    }

    /// Permanently remove a note.
    fn remove(&self, note_id: &str) -> impl Future<Output = Result<()>> + Send;
}

/// What the caller knew about the note when the editor left it.
#[derive(Debug, Clone)]
pub struct CleanupCandidate {
    pub id: String,
    pub is_deleted: bool,
}

/// Runs at most one cleanup per note id at a time.
pub struct DraftCleanup<S> {
    store: S,
    in_flight: Mutex<HashSet<String>>,
}

impl<S: DraftStore> DraftCleanup<S> {
    pub fn new(store: S) -> Self {
        Self { store, in_flight: Mutex::new(HashSet::new()) }
    }

    /// Remove the candidate if it is still an abandoned empty draft.
    /// Returns true only when a removal actually happened.
    pub async fn cleanup(&self, candidate: &CleanupCandidate) -> Result<bool> {
        if candidate.id.is_empty() || candidate.is_deleted {
            return Ok(false);
        }
        let note_id = candidate.id.as_str();
        if !self.lock_in_flight().insert(note_id.to_string()) {
            return Ok(false);
        }

        let result = self.cleanup_inner(note_id).await;
        self.lock_in_flight().remove(note_id);
        result
    }

    async fn cleanup_inner(&self, note_id: &str) -> Result<bool> {
        let in_use = || self.store.current_note_id().as_deref() == Some(note_id);

        let Some(fetched) = fetch_unless(in_use, self.store.latest(note_id)).await else {
            debug!(%note_id, "draft is back in use; skipping cleanup");
            return Ok(false);
        };
        let record = fetched.context("failed to fetch latest draft record")?;
        let Some(record) = record else {
            return Ok(false);
        };
        if record.is_deleted || !self.store.is_empty(&record) {
            return Ok(false);
        }

        self.store.remove(note_id).await.context("failed to remove empty draft")?;
        debug!(%note_id, "removed abandoned empty draft");
        Ok(true)
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashSet<String>> {
        self.in_flight.lock().expect("in-flight set lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use tokio::time;

    use super::*;

    #[derive(Clone)]
    struct MockStore {
        current_id: Arc<Mutex<Option<String>>>,
        /// Switch the current id to this value after the fetch starts.
        switch_to_on_fetch: Arc<Mutex<Option<String>>>,
        record: Arc<Mutex<Option<NoteRecord>>>,
        fetch_delay: Duration,
        removed: Arc<Mutex<Vec<String>>>,
        fetch_count: Arc<AtomicUsize>,
    }

    impl MockStore {
        fn new(record: Option<NoteRecord>) -> Self {
            Self {
                current_id: Arc::new(Mutex::new(None)),
                switch_to_on_fetch: Arc::new(Mutex::new(None)),
                record: Arc::new(Mutex::new(record)),
                fetch_delay: Duration::ZERO,
                removed: Arc::new(Mutex::new(Vec::new())),
                fetch_count: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn set_current(&self, id: Option<&str>) {
            *self.current_id.lock().unwrap() = id.map(str::to_string);
        }

        fn removed(&self) -> Vec<String> {
            self.removed.lock().unwrap().clone()
        }
    }

    impl DraftStore for MockStore {
        fn current_note_id(&self) -> Option<String> {
            self.current_id.lock().unwrap().clone()
        }

        async fn latest(&self, _note_id: &str) -> Result<Option<NoteRecord>> {
            self.fetch_count.fetch_add(1, Ordering::SeqCst);
            if let Some(next) = self.switch_to_on_fetch.lock().unwrap().take() {
                *self.current_id.lock().unwrap() = Some(next);
            }
            if !self.fetch_delay.is_zero() {
                time::sleep(self.fetch_delay).await;
            }
            Ok(self.record.lock().unwrap().clone())
        }

        async fn remove(&self, note_id: &str) -> Result<()> {
            self.removed.lock().unwrap().push(note_id.to_string());
            Ok(())
        }
    }

    fn empty_record(id: &str) -> NoteRecord {
        NoteRecord {
            id: id.to_string(),
            title: "  ".to_string(),
            plain_text: "\n".to_string(),
            is_deleted: false,
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn candidate(id: &str) -> CleanupCandidate {
        CleanupCandidate { id: id.to_string(), is_deleted: false }
    }

    // ── Removal path ────────────────────────────────────────────────

    #[tokio::test]
    async fn removes_an_abandoned_empty_draft() {
        let store = MockStore::new(Some(empty_record("n-1")));
        let cleanup = DraftCleanup::new(store.clone());

        let removed = cleanup.cleanup(&candidate("n-1")).await.expect("cleanup should succeed");
        assert!(removed);
        assert_eq!(store.removed(), vec!["n-1".to_string()]);
    }

    // ── Entry guards ────────────────────────────────────────────────

    #[tokio::test]
    async fn skips_candidates_without_id_or_already_deleted() {
        let store = MockStore::new(Some(empty_record("n-1")));
        let cleanup = DraftCleanup::new(store.clone());

        let no_id = CleanupCandidate { id: String::new(), is_deleted: false };
        assert!(!cleanup.cleanup(&no_id).await.unwrap());

        let deleted = CleanupCandidate { id: "n-1".to_string(), is_deleted: true };
        assert!(!cleanup.cleanup(&deleted).await.unwrap());

        assert_eq!(store.fetch_count.load(Ordering::SeqCst), 0);
        assert!(store.removed().is_empty());
    }

    #[tokio::test]
    async fn skips_when_the_note_is_currently_open() {
        let store = MockStore::new(Some(empty_record("n-1")));
        store.set_current(Some("n-1"));
        let cleanup = DraftCleanup::new(store.clone());

        assert!(!cleanup.cleanup(&candidate("n-1")).await.unwrap());
        assert_eq!(store.fetch_count.load(Ordering::SeqCst), 0);
    }

    // ── Record guards ───────────────────────────────────────────────

    #[tokio::test]
    async fn skips_when_the_record_is_gone_or_deleted() {
        let missing = MockStore::new(None);
        let cleanup = DraftCleanup::new(missing.clone());
        assert!(!cleanup.cleanup(&candidate("n-1")).await.unwrap());

        let mut record = empty_record("n-1");
        record.is_deleted = true;
        let deleted = MockStore::new(Some(record));
        let cleanup = DraftCleanup::new(deleted.clone());
        assert!(!cleanup.cleanup(&candidate("n-1")).await.unwrap());
        assert!(deleted.removed().is_empty());
    }

    #[tokio::test]
    async fn keeps_drafts_that_gained_content() {
        let mut record = empty_record("n-1");
        record.plain_text = "actual words".to_string();
        let store = MockStore::new(Some(record));
        let cleanup = DraftCleanup::new(store.clone());

        assert!(!cleanup.cleanup(&candidate("n-1")).await.unwrap());
        assert!(store.removed().is_empty());
    }

    // ── Race protection ─────────────────────────────────────────────

    #[tokio::test]
    async fn skips_when_the_user_navigates_back_during_the_fetch() {
        let store = MockStore::new(Some(empty_record("n-1")));
        *store.switch_to_on_fetch.lock().unwrap() = Some("n-1".to_string());
        let cleanup = DraftCleanup::new(store.clone());

        assert!(!cleanup.cleanup(&candidate("n-1")).await.unwrap());
        assert_eq!(store.fetch_count.load(Ordering::SeqCst), 1);
        assert!(store.removed().is_empty());
    }

    #[tokio::test]
    async fn concurrent_cleanups_for_one_note_run_once() {
        time::pause();
        let mut store = MockStore::new(Some(empty_record("n-1")));
        store.fetch_delay = Duration::from_millis(50);
        let cleanup = Arc::new(DraftCleanup::new(store.clone()));

        let first = {
            let cleanup = cleanup.clone();
            tokio::spawn(async move { cleanup.cleanup(&candidate("n-1")).await })
        };
        tokio::task::yield_now().await;

        // Second attempt while the fetch is parked.
        assert!(!cleanup.cleanup(&candidate("n-1")).await.unwrap());

        time::advance(Duration::from_millis(60)).await;
        let removed = first.await.expect("task should not panic").expect("cleanup should succeed");
        assert!(removed);
        assert_eq!(store.removed(), vec!["n-1".to_string()]);
    }

    #[tokio::test]
    async fn in_flight_entry_clears_even_when_the_fetch_fails() {
        #[derive(Clone)]
        struct FailingStore;

        impl DraftStore for FailingStore {
            fn current_note_id(&self) -> Option<String> {
                None
            }
            async fn latest(&self, _note_id: &str) -> Result<Option<NoteRecord>> {
                anyhow::bail!("store unavailable")
            }
            async fn remove(&self, _note_id: &str) -> Result<()> {
                Ok(())
            }
        }

        let cleanup = DraftCleanup::new(FailingStore);
        assert!(cleanup.cleanup(&candidate("n-1")).await.is_err());
        // The id is free for a later attempt.
        assert!(cleanup.cleanup(&candidate("n-1")).await.is_err());
    }
}
