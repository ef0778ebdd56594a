// Coalescing batch scheduler for injected asynchronous effects.
//
// Per-key debounce with last-write-wins payload replacement; elapsed
// keys move to a shared ready queue that a single flush drains in
// bounded batches. A failed batch is requeued whole and retried after
// a delay. Key lifecycle: idle -> pending -> ready -> in-flight ->
// idle (or back to ready on failure).

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, warn};

/// Default debounce window per key.
const DEFAULT_DEBOUNCE_MS: u64 = 1500;
/// Default back-off when a flush finds another flush in progress.
const DEFAULT_FLUSH_INTERVAL_MS: u64 = 2600;
/// Default delay before retrying a failed batch.
const DEFAULT_RETRY_DELAY_MS: u64 = 2200;
/// Default upper bound on keys per flush.
const DEFAULT_MAX_BATCH_SIZE: usize = 16;

// ── Payload and sink traits ─────────────────────────────────────────

/// A payload that coalesces under a string key: a later payload with
/// the same key supersedes an earlier one that has not yet flushed.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Injected batch effect. Any error fails the whole batch.
///
/// Returns `Send` futures so the scheduler can run its flushes on a
/// multi-threaded tokio runtime.
pub trait BatchSink<P>: Send + Sync + 'static {
    fn deliver(&self, batch: &[P]) -> impl Future<Output = anyhow::Result<()>> + Send;
}

// ── Configuration ───────────────────────────────────────────────────

/// Tuning knobs for a scheduler instance.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Quiet period a key must observe before its payload becomes ready.
    pub debounce: Duration,
    /// Back-off before re-attempting a flush that found one in progress.
    pub flush_interval: Duration,
    /// Delay before a failed batch is flushed again.
    pub retry_delay: Duration,
    /// Maximum number of keys pulled into one flush.
    pub max_batch_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            flush_interval: Duration::from_millis(DEFAULT_FLUSH_INTERVAL_MS),
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

// ── Scheduler ───────────────────────────────────────────────────────

/// Debouncing batch scheduler around an injected effect.
///
/// Cheap to clone; all clones share one state. Methods must be called
/// within a tokio runtime (timers are spawned tasks).
pub struct CoalescingScheduler<P, S> {
    inner: Arc<Inner<P, S>>,
}

impl<P, S> Clone for CoalescingScheduler<P, S> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

struct Inner<P, S> {
    config: SchedulerConfig,
    sink: S,
    state: Mutex<State<P>>,
}

struct State<P> {
    /// Latest payload per key (last-write-wins).
    payloads: HashMap<String, P>,
    /// Active debounce generation per key; a sleeper whose generation
    /// no longer matches was superseded and must not fire.
    debounce_gens: HashMap<String, u64>,
    /// Keys whose debounce elapsed, in arrival order.
    ready: Vec<String>,
    flush_scheduled: bool,
    flush_in_flight: bool,
    /// Bumped by `cancel_all`; sleeping timer tasks from an older epoch
    /// are void.
    epoch: u64,
    next_gen: u64,
}

impl<P, S> CoalescingScheduler<P, S>
where
    P: Keyed + Send + Sync + 'static,
    S: BatchSink<P>,
{
    pub fn new(config: SchedulerConfig, sink: S) -> Self {
        let inner = Inner {
            config,
            sink,
            state: Mutex::new(State {
                payloads: HashMap::new(),
                debounce_gens: HashMap::new(),
                ready: Vec::new(),
                flush_scheduled: false,
                flush_in_flight: false,
                epoch: 0,
                next_gen: 0,
            }),
        };
        Self { inner: Arc::new(inner) }
    }

    /// Store `payload` for its key and (re)start that key's debounce
    /// window. Never fails; delivery problems surface in logs and via
    /// retries.
    pub fn schedule(&self, payload: P) {
        let key = payload.key().to_string();
        if key.is_empty() {
            return;
        }

        let (generation, epoch) = {
            let mut state = self.inner.lock_state();
            state.payloads.insert(key.clone(), payload);
            let generation = state.next_gen;
            state.next_gen += 1;
            // Replacing the stored generation orphans any sleeper
            // already started for this key.
            state.debounce_gens.insert(key.clone(), generation);
            (generation, state.epoch)
        };

        let inner = self.inner.clone();
        tokio::spawn(async move {
            tokio::time::sleep(inner.config.debounce).await;
            Inner::debounce_elapsed(&inner, &key, generation, epoch);
        });
    }

    /// Promote every pending key to ready and drain the queue batch by
    /// batch. Backs off if another flush already owns the queue.
    pub async fn flush_all(&self) {
        {
            let mut state = self.inner.lock_state();
            let pending: Vec<String> = state.debounce_gens.drain().map(|(key, _)| key).collect();
            for key in pending {
                if !state.ready.iter().any(|k| *k == key) {
                    state.ready.push(key);
                }
            }
        }

        while Inner::run_flush_once(&self.inner).await {}

        let busy = {
            let state = self.inner.lock_state();
            state.flush_in_flight && !state.ready.is_empty()
        };
        if busy {
            Inner::schedule_flush(&self.inner, self.inner.config.flush_interval);
        }
    }

    /// Drop a key's timer and payload without invoking the effect. An
    /// attempt already in flight for this key is not interrupted.
    pub fn cancel(&self, key: &str) {
        let mut state = self.inner.lock_state();
        state.debounce_gens.remove(key);
        state.payloads.remove(key);
        state.ready.retain(|k| k != key);
    }

    /// Drop all timers and payloads without invoking the effect.
    pub fn cancel_all(&self) {
        let mut state = self.inner.lock_state();
        state.debounce_gens.clear();
        state.payloads.clear();
        state.ready.clear();
        state.flush_scheduled = false;
        state.epoch += 1;
    }

    /// Keys still debouncing plus keys waiting in the ready queue.
    pub fn pending_count(&self) -> usize {
        let state = self.inner.lock_state();
        state.debounce_gens.len() + state.ready.len()
    }
}

impl<P, S> Inner<P, S>
where
    P: Keyed + Send + Sync + 'static,
    S: BatchSink<P>,
{
    fn lock_state(&self) -> MutexGuard<'_, State<P>> {
        self.state.lock().expect("scheduler state lock poisoned")
    }

    fn debounce_elapsed(inner: &Arc<Self>, key: &str, generation: u64, epoch: u64) {
        {
            let mut state = inner.lock_state();
            if state.epoch != epoch || state.debounce_gens.get(key) != Some(&generation) {
                return; // superseded or cancelled while we slept
            }
            state.debounce_gens.remove(key);
            if !state.payloads.contains_key(key) {
                return;
            }
            if !state.ready.iter().any(|k| k == key) {
                state.ready.push(key.to_string());
            }
        }
        Self::schedule_flush(inner, Duration::ZERO);
    }

    /// Arm the single shared flush timer, if it is not armed already.
    fn schedule_flush(inner: &Arc<Self>, delay: Duration) {
        let epoch = {
            let mut state = inner.lock_state();
            if state.flush_scheduled {
                return;
            }
            state.flush_scheduled = true;
            state.epoch
        };

        let inner = inner.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut state = inner.lock_state();
                if state.epoch != epoch {
                    return; // cancel_all already disarmed us
                }
                state.flush_scheduled = false;
            }
            Self::run_flush_once(&inner).await;
        });
    }

    /// Pull one batch off the ready queue and deliver it. Returns true
    /// only when a batch was delivered successfully.
    async fn run_flush_once(inner: &Arc<Self>) -> bool {
        let batch: Vec<P> = {
            let mut state = inner.lock_state();
            if state.flush_in_flight || state.ready.is_empty() {
                return false;
            }
            state.flush_in_flight = true;
            let take = state.ready.len().min(inner.config.max_batch_size);
            let keys: Vec<String> = state.ready.drain(..take).collect();
            keys.iter().filter_map(|key| state.payloads.remove(key)).collect()
        };

        if batch.is_empty() {
            // Keys cancelled between readiness and flush; nothing to send.
            let more = {
                let mut state = inner.lock_state();
                state.flush_in_flight = false;
                !state.ready.is_empty()
            };
            if more {
                Self::schedule_flush(inner, Duration::ZERO);
            }
            return false;
        }

        let batch_len = batch.len();
        debug!(batch_len, "delivering coalesced batch");
        let result = inner.sink.deliver(&batch).await;

        match result {
            Ok(()) => {
                let more = {
                    let mut state = inner.lock_state();
                    state.flush_in_flight = false;
                    !state.ready.is_empty()
                };
                if more {
                    Self::schedule_flush(inner, Duration::ZERO);
                }
                true
            }
            Err(error) => {
                warn!(%error, batch_len, "batch delivery failed; requeueing for retry");
                {
                    let mut state = inner.lock_state();
                    state.flush_in_flight = false;
                    for payload in batch {
                        let key = payload.key().to_string();
                        if !state.ready.iter().any(|k| *k == key) {
                            state.ready.push(key.clone());
                        }
                        state.payloads.insert(key, payload);
                    }
                }
                Self::schedule_flush(inner, inner.config.retry_delay);
                false
            }
        }
    }
}
