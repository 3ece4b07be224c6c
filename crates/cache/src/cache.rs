//! Deduplicating TTL cache with mutation-driven invalidation.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde_json::Value;

use integrador_core::{DataError, DataResult};

use crate::key::QueryKey;
use crate::status::{QueryResult, QueryStatus};

type SharedFetch = Shared<BoxFuture<'static, DataResult<Value>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryStatus {
    Pending,
    Fresh,
    Stale,
    Error,
}

#[derive(Debug)]
struct CacheEntry {
    status: EntryStatus,
    value: Option<Value>,
    error: Option<DataError>,
    fresh_until: Option<Instant>,
    /// Generation of the fetch that owns this entry's settlement. A fetch
    /// settling under an older generation must not touch the entry.
    generation: u64,
}

impl CacheEntry {
    fn pending(generation: u64) -> Self {
        Self {
            status: EntryStatus::Pending,
            value: None,
            error: None,
            fresh_until: None,
            generation,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        self.status == EntryStatus::Fresh && self.fresh_until.is_some_and(|until| now < until)
    }
}

/// Keyed cache of remote read results.
///
/// # Concurrency contract
/// Concurrent `fetch` calls for one key collapse into exactly one underlying
/// fetch; every caller observes the identical settled value or error. Locks
/// are short-lived and never held across an await (`in_flight` before
/// `entries` whenever both are taken).
pub struct QueryCache {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    in_flight: Mutex<HashMap<QueryKey, (u64, SharedFetch)>>,
    generation: AtomicU64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Read through the cache.
    ///
    /// A fresh entry is returned without invoking `fetcher`. A fetch already
    /// in flight for the key is joined. Otherwise `fetcher` runs once; on
    /// success the result becomes fresh until `now + ttl`, on failure the
    /// error is recorded without caching a value so the next read retries.
    pub async fn fetch<F>(&self, key: &QueryKey, ttl: Duration, fetcher: F) -> DataResult<Value>
    where
        F: FnOnce() -> BoxFuture<'static, DataResult<Value>>,
    {
        let (generation, shared) = {
            let mut in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
            let mut entries = self.entries.lock().expect("entries lock poisoned");

            if let Some(entry) = entries.get(key) {
                if entry.is_fresh(Instant::now()) {
                    let value = entry.value.clone().unwrap_or(Value::Null);
                    return Ok(value);
                }
            }

            if let Some((generation, shared)) = in_flight.get(key) {
                (*generation, shared.clone())
            } else {
                let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
                let shared = fetcher().shared();
                in_flight.insert(key.clone(), (generation, shared.clone()));

                let entry = entries
                    .entry(key.clone())
                    .or_insert_with(|| CacheEntry::pending(generation));
                entry.status = EntryStatus::Pending;
                entry.error = None;
                entry.generation = generation;

                tracing::debug!(%key, generation, "cache miss, fetch started");
                (generation, shared)
            }
        };

        let result = shared.await;
        self.settle(key, generation, ttl, &result);
        result
    }

    /// Record a settled fetch. Idempotent: every collapsed caller invokes
    /// it, only the first application has an effect.
    fn settle(&self, key: &QueryKey, generation: u64, ttl: Duration, result: &DataResult<Value>) {
        {
            let mut in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
            if in_flight.get(key).is_some_and(|(g, _)| *g == generation) {
                in_flight.remove(key);
            }
        }

        let mut entries = self.entries.lock().expect("entries lock poisoned");
        let Some(entry) = entries.get_mut(key) else {
            // Torn down (logout) while the fetch was in flight.
            return;
        };
        if entry.generation != generation {
            return;
        }

        match (entry.status, result) {
            (EntryStatus::Pending, Ok(value)) => {
                entry.status = EntryStatus::Fresh;
                entry.value = Some(value.clone());
                entry.error = None;
                entry.fresh_until = Some(Instant::now() + ttl);
            }
            (EntryStatus::Pending, Err(err)) => {
                entry.status = EntryStatus::Error;
                entry.error = Some(err.clone());
                entry.fresh_until = None;
            }
            // Invalidated while in flight: keep the value available but do
            // not promote it to fresh, so the next read refetches.
            (EntryStatus::Stale, Ok(value)) => {
                entry.value = Some(value.clone());
                entry.error = None;
            }
            (EntryStatus::Stale, Err(_)) => {}
            _ => {}
        }
    }

    /// Run a mutation, invalidating `affected` keys on success only.
    ///
    /// Staleness is lazy: invalidated entries keep serving nothing new and
    /// the next read refetches. A failed mutation leaves the cache exactly
    /// as it was and propagates the error.
    pub async fn mutate<T, Fut>(&self, mutation: Fut, affected: &[QueryKey]) -> DataResult<T>
    where
        Fut: Future<Output = DataResult<T>>,
    {
        let output = mutation.await?;
        for key in affected {
            self.invalidate(key);
        }
        Ok(output)
    }

    /// Mark one entry stale, forcing the next read to refetch.
    pub fn invalidate(&self, key: &QueryKey) {
        let mut entries = self.entries.lock().expect("entries lock poisoned");
        if let Some(entry) = entries.get_mut(key) {
            entry.status = EntryStatus::Stale;
            entry.fresh_until = None;
            tracing::debug!(%key, "cache entry invalidated");
        }
    }

    /// Mark every entry stale (identity change).
    pub fn invalidate_all(&self) {
        let mut entries = self.entries.lock().expect("entries lock poisoned");
        for entry in entries.values_mut() {
            entry.status = EntryStatus::Stale;
            entry.fresh_until = None;
        }
        tracing::debug!(count = entries.len(), "all cache entries invalidated");
    }

    /// Full teardown (logout): drop every entry.
    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("entries lock poisoned")
            .clear();
    }

    /// Non-blocking view of a key's state for callers that must render
    /// without awaiting.
    pub fn snapshot(&self, key: &QueryKey) -> QueryResult {
        let entries = self.entries.lock().expect("entries lock poisoned");
        let Some(entry) = entries.get(key) else {
            return QueryResult::idle();
        };
        match entry.status {
            EntryStatus::Pending => QueryResult::loading(entry.value.clone()),
            EntryStatus::Fresh | EntryStatus::Stale => match &entry.value {
                Some(value) => QueryResult::success(value.clone()),
                None => QueryResult::idle(),
            },
            EntryStatus::Error => match &entry.error {
                Some(err) => QueryResult::error(err.clone()),
                None => QueryResult::idle(),
            },
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}
