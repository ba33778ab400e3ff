use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use huddle_core::domain::UserId;
use huddle_core::store::UserStore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::BulkFetcher;
use crate::observe::FlushObserver;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BatchKind {
    Profiles,
    Statuses,
}

impl BatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Statuses => "statuses",
        }
    }
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coalesces individual user-id lookups into bulk fetches.
///
/// One batcher exists per [`BatchKind`], constructed once at startup and
/// shared as `Arc<IdBatcher>`. Ids accumulate in a deduplicated pending set
/// and are flushed either when an `add` would push the set to `max_batch`,
/// or on a recurring timer that starts with the first `add`.
///
/// Flushes are fire-and-forget: the set is drained synchronously, the
/// network call runs on its own task, and results merge into the shared
/// [`UserStore`]. Ids in a failed flush are not re-queued; they are fetched
/// again the next time a post from that author shows up.
///
/// Must be used from within a tokio runtime: `add` and `flush` spawn the
/// timer and fetch tasks onto it.
pub struct IdBatcher {
    kind: BatchKind,
    max_batch: usize,
    flush_interval: Duration,
    pending: Mutex<HashSet<UserId>>,
    timer: Mutex<Option<JoinHandle<()>>>,
    fetcher: Arc<dyn BulkFetcher>,
    store: Arc<UserStore>,
    observer: Arc<dyn FlushObserver>,
}

impl IdBatcher {
    pub fn new(
        kind: BatchKind,
        max_batch: usize,
        flush_interval: Duration,
        fetcher: Arc<dyn BulkFetcher>,
        store: Arc<UserStore>,
        observer: Arc<dyn FlushObserver>,
    ) -> Arc<Self> {
        Arc::new(Self {
            kind,
            max_batch,
            flush_interval,
            pending: Mutex::new(HashSet::new()),
            timer: Mutex::new(None),
            fetcher,
            store,
            observer,
        })
    }

    /// Queues `id` for the next bulk fetch.
    ///
    /// The threshold check precedes the insertion: an `add` that would push
    /// the set to `max_batch` drains and flushes the current contents first,
    /// and the incoming id lands in the now-empty set, riding the next batch.
    /// Also starts the recurring flush timer if it is not running.
    pub fn add(self: &Arc<Self>, id: UserId) {
        let drained = {
            let mut pending = lock(&self.pending);
            let drained = if pending.len() + 1 >= self.max_batch {
                pending.drain().collect::<Vec<_>>()
            } else {
                Vec::new()
            };
            pending.insert(id);
            drained
        };

        if !drained.is_empty() {
            self.spawn_fetch(drained);
        }
        self.ensure_timer();
    }

    /// Atomically empties the pending set and returns its contents. Safe to
    /// call on an empty set.
    pub fn drain_all(&self) -> Vec<UserId> {
        lock(&self.pending).drain().collect()
    }

    /// Drains and fetches whatever is pending; no-op when the set is empty.
    pub fn flush(&self) {
        let drained = self.drain_all();
        if drained.is_empty() {
            return;
        }
        self.spawn_fetch(drained);
    }

    /// Stops the recurring timer. Idempotent. Pending ids are kept; the next
    /// `add` starts a fresh timer. An in-flight fetch is never cancelled.
    pub fn cleanup(&self) {
        if let Some(handle) = lock(&self.timer).take() {
            handle.abort();
            debug!(kind = %self.kind, "stopped recurring flush timer");
        }
    }

    pub fn pending_len(&self) -> usize {
        lock(&self.pending).len()
    }

    pub fn timer_active(&self) -> bool {
        lock(&self.timer).is_some()
    }

    fn ensure_timer(self: &Arc<Self>) {
        let mut slot = lock(&self.timer);
        if slot.is_some() {
            return;
        }

        let weak = Arc::downgrade(self);
        let interval = self.flush_interval;
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick of a tokio interval completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(batcher) = weak.upgrade() else { break };
                if batcher.pending_len() > 0 {
                    batcher.flush();
                }
            }
        }));
        debug!(kind = %self.kind, interval_secs = interval.as_secs(), "started recurring flush timer");
    }

    fn spawn_fetch(&self, ids: Vec<UserId>) {
        self.observer.flush_started(self.kind, ids.len());

        let kind = self.kind;
        let fetcher = Arc::clone(&self.fetcher);
        let store = Arc::clone(&self.store);
        let observer = Arc::clone(&self.observer);
        tokio::spawn(async move {
            let outcome = match kind {
                BatchKind::Profiles => {
                    fetcher.fetch_profiles_by_ids(&ids).await.map(|profiles| {
                        let received = profiles.len();
                        store.receive_profiles(profiles);
                        received
                    })
                }
                BatchKind::Statuses => {
                    fetcher.fetch_statuses_by_ids(&ids).await.map(|statuses| {
                        let received = statuses.len();
                        store.receive_statuses(statuses);
                        received
                    })
                }
            };

            match outcome {
                Ok(received) => {
                    debug!(
                        event_name = "fetch.batch.flush_completed",
                        kind = %kind,
                        requested = ids.len(),
                        received,
                        "bulk fetch merged into store"
                    );
                    observer.flush_completed(kind, received);
                }
                Err(error) => {
                    warn!(
                        event_name = "fetch.batch.flush_failed",
                        kind = %kind,
                        requested = ids.len(),
                        error = %error,
                        "bulk fetch failed; ids will be fetched again on next sighting"
                    );
                    observer.flush_failed(kind, &error);
                }
            }
        });
    }
}

impl Drop for IdBatcher {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
