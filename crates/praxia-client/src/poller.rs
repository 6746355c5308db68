//! Bounded polling for long-running analyses.
//!
//! [`poll`] re-fetches a resource on a fixed interval until it leaves its
//! processing state or the attempt budget runs out. [`Poller`] runs such
//! loops in the background, one per resource, and guarantees that a job
//! cancelled or replaced never reports its result.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, instrument, trace, warn};

use praxia_core::Result;
use praxia_core::error::PollError;
use praxia_core::models::PollStatus;

/// Polling schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Delay between consecutive attempts.
    pub interval: Duration,
    /// Total number of fetches before giving up.
    pub max_attempts: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_attempts: 30,
        }
    }
}

impl PollOptions {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

/// Fetch until the resource is no longer processing.
///
/// The first fetch happens immediately and consecutive fetches are at least
/// `interval` apart. A failed fetch uses up an attempt; an expired session
/// stops polling at once. After `max_attempts` the error is
/// [`PollError::Exhausted`] when the last fetch failed and
/// [`PollError::Timeout`] otherwise.
#[instrument(skip(fetch), fields(interval_ms = options.interval.as_millis() as u64, max_attempts = options.max_attempts))]
pub async fn poll<T, F, Fut>(mut fetch: F, options: PollOptions) -> Result<T>
where
    T: PollStatus,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 1..=options.max_attempts {
        match fetch().await {
            Ok(value) if !value.is_processing() => {
                debug!(attempt, "Polled resource is ready");
                return Ok(value);
            }
            Ok(_) => {
                trace!(attempt, "Still processing");
                last_error = None;
            }
            Err(err) if err.is_auth_expired() => return Err(err),
            Err(err) => {
                warn!(attempt, error = %err, "Status check failed");
                last_error = Some(err);
            }
        }

        if attempt < options.max_attempts {
            tokio::time::sleep(options.interval).await;
        }
    }

    let attempts = options.max_attempts;
    Err(match last_error {
        Some(err) => PollError::Exhausted {
            attempts,
            last_error: Box::new(err),
        },
        None => PollError::Timeout { attempts },
    }
    .into())
}

struct JobEntry {
    id: u64,
    handle: JoinHandle<()>,
}

type Jobs<K> = Arc<Mutex<HashMap<K, JobEntry>>>;

fn lock<K>(jobs: &Jobs<K>) -> MutexGuard<'_, HashMap<K, JobEntry>> {
    jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Registry of background polling jobs keyed by resource.
///
/// Starting a job for a key that is already being polled cancels the old
/// job. Dropping the registry cancels everything it still owns.
pub struct Poller<K> {
    jobs: Jobs<K>,
    next_id: AtomicU64,
}

impl<K> Default for Poller<K> {
    fn default() -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<K> Poller<K>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Poll `key` in the background and hand the outcome to `on_complete`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<T, F, Fut, C>(
        &self,
        key: K,
        fetch: F,
        options: PollOptions,
        on_complete: C,
    ) -> PollJob<K>
    where
        T: PollStatus + Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        C: FnOnce(Result<T>) + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let jobs = Arc::clone(&self.jobs);
        let task_key = key.clone();

        // Held until the entry is inserted so the task cannot finish first.
        let mut registry = lock(&self.jobs);
        if let Some(previous) = registry.remove(&key) {
            debug!(?key, "Replacing existing polling job");
            previous.handle.abort();
        }

        let handle = tokio::spawn(async move {
            let outcome = poll(fetch, options).await;

            let current = {
                let mut jobs = lock(&jobs);
                let current = jobs.get(&task_key).is_some_and(|entry| entry.id == id);
                if current {
                    jobs.remove(&task_key);
                }
                current
            };

            if current {
                on_complete(outcome);
            } else {
                trace!(key = ?task_key, "Dropping result of superseded polling job");
            }
        });

        registry.insert(key.clone(), JobEntry { id, handle });
        debug!(?key, job = id, "Polling job started");

        PollJob {
            key,
            id,
            jobs: Arc::clone(&self.jobs),
        }
    }

    /// Cancel the job polling `key`. Returns false if there was none.
    ///
    /// Once this returns true the job's callback will not run.
    pub fn cancel(&self, key: &K) -> bool {
        match lock(&self.jobs).remove(key) {
            Some(entry) => {
                entry.handle.abort();
                debug!(?key, "Polling job cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancel every job.
    pub fn cancel_all(&self) {
        for (_, entry) in lock(&self.jobs).drain() {
            entry.handle.abort();
        }
    }

    pub fn is_polling(&self, key: &K) -> bool {
        lock(&self.jobs).contains_key(key)
    }

    /// Number of running jobs.
    pub fn len(&self) -> usize {
        lock(&self.jobs).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K> Drop for Poller<K> {
    fn drop(&mut self) {
        for (_, entry) in lock(&self.jobs).drain() {
            entry.handle.abort();
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for Poller<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let jobs = lock(&self.jobs);
        f.debug_struct("Poller")
            .field("keys", &jobs.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Handle to one background polling job.
pub struct PollJob<K> {
    key: K,
    id: u64,
    jobs: Jobs<K>,
}

impl<K> PollJob<K>
where
    K: Eq + Hash + fmt::Debug,
{
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Cancel this job. Returns false if it already finished, was cancelled,
    /// or was replaced by a newer job for the same key.
    pub fn cancel(&self) -> bool {
        let mut jobs = lock(&self.jobs);
        if !jobs.get(&self.key).is_some_and(|entry| entry.id == self.id) {
            return false;
        }

        if let Some(entry) = jobs.remove(&self.key) {
            entry.handle.abort();
        }
        debug!(key = ?self.key, "Polling job cancelled");
        true
    }

    /// Returns true while this job is still running.
    pub fn is_active(&self) -> bool {
        lock(&self.jobs)
            .get(&self.key)
            .is_some_and(|entry| entry.id == self.id)
    }
}

impl<K: fmt::Debug> fmt::Debug for PollJob<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollJob")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish()
    }
}
