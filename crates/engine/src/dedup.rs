// Dedup-in-flight scheduler for idempotent keyed effects.
//
// Simpler sibling of the coalescing scheduler: no payloads, no
// batching, no retry. A key with an attempt in flight absorbs further
// requests; distinct keys run concurrently.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::warn;

/// Injected per-key effect, e.g. removing one note from a remote index.
pub trait KeyedSink: Send + Sync + 'static {
    fn apply(&self, key: &str) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Fire-and-forget dispatcher that runs at most one effect per key at
/// a time. Cheap to clone; clones share the in-flight set.
pub struct DedupScheduler<S> {
    inner: Arc<DedupInner<S>>,
}

impl<S> Clone for DedupScheduler<S> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

struct DedupInner<S> {
    sink: S,
    in_flight: Mutex<HashSet<String>>,
}

impl<S: KeyedSink> DedupScheduler<S> {
    pub fn new(sink: S) -> Self {
        Self { inner: Arc::new(DedupInner { sink, in_flight: Mutex::new(HashSet::new()) }) }
    }

    /// Dispatch the effect for `key` unless an attempt is already in
    /// flight. The caller does not wait; failures are logged and the
    /// key is released either way, so a later request can try again.
    pub fn schedule(&self, key: &str) {
        if key.is_empty() {
            return;
        }
        {
            let mut in_flight = self.inner.lock_in_flight();
            if !in_flight.insert(key.to_string()) {
                return;
            }
        }

        let inner = self.inner.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            if let Err(error) = inner.sink.apply(&key).await {
                warn!(%key, %error, "keyed effect failed");
            }
            inner.lock_in_flight().remove(&key);
        });
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner.lock_in_flight().len()
    }
}

impl<S> DedupInner<S> {
    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.in_flight.lock().expect("in-flight set lock poisoned")
    }
}
