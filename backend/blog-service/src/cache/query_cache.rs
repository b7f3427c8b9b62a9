use dashmap::DashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::metrics::QUERY_CACHE_EVENTS;

#[derive(Clone)]
struct Entry<V> {
    value: V,
    fetched_at: Instant,
}

/// Keyed cache of query results with explicit invalidation.
///
/// Writes happen only through [`QueryCache::fetch_with`] after a successful
/// fetch; callers never patch cached values in place.
///
/// Every invalidation bumps `generation`. A fetch that started under an
/// older generation hands its result back to the caller but never stores
/// it, so a read racing a mutation cannot repopulate the cache with
/// pre-mutation rows.
pub struct QueryCache<K, V> {
    name: &'static str,
    entries: DashMap<K, Entry<V>>,
    generation: RwLock<u64>,
    stale_after: Option<Duration>,
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(name: &'static str, stale_after: Option<Duration>) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            generation: RwLock::new(0),
            stale_after,
        }
    }

    /// Fresh cached value, if any
    pub fn get(&self, key: &K) -> Option<V> {
        let entry = self.entries.get(key)?;
        let fresh = self
            .stale_after
            .map_or(true, |ttl| entry.fetched_at.elapsed() < ttl);
        fresh.then(|| entry.value.clone())
    }

    /// Return the cached value or run `fetch` and cache its result.
    ///
    /// Errors are returned as-is and never cached.
    pub async fn fetch_with<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            QUERY_CACHE_EVENTS.with_label_values(&[self.name, "hit"]).inc();
            debug!(cache = self.name, ?key, "query cache HIT");
            return Ok(value);
        }

        QUERY_CACHE_EVENTS.with_label_values(&[self.name, "miss"]).inc();
        debug!(cache = self.name, ?key, "query cache MISS");

        let started = *self.read_generation();
        let value = fetch().await?;

        // Held until the insert so no invalidation slips in between
        let generation = self.read_generation();
        if *generation == started {
            self.entries.insert(
                key,
                Entry {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                },
            );
        } else {
            debug!(cache = self.name, ?key, "query cache DISCARD (invalidated during fetch)");
        }
        Ok(value)
    }

    fn read_generation(&self) -> RwLockReadGuard<'_, u64> {
        self.generation.read().unwrap_or_else(|e| e.into_inner())
    }

    fn bump_generation(&self) -> RwLockWriteGuard<'_, u64> {
        let mut generation = self.generation.write().unwrap_or_else(|e| e.into_inner());
        *generation += 1;
        generation
    }

    /// Drop one entry; the next read refetches
    pub fn invalidate(&self, key: &K) -> bool {
        let _generation = self.bump_generation();
        let removed = self.entries.remove(key).is_some();
        if removed {
            QUERY_CACHE_EVENTS
                .with_label_values(&[self.name, "invalidate"])
                .inc();
            debug!(cache = self.name, ?key, "query cache INVALIDATE");
        }
        removed
    }

    /// Drop every entry; returns how many were dropped
    pub fn invalidate_all(&self) -> usize {
        let _generation = self.bump_generation();
        let count = self.entries.len();
        self.entries.clear();
        if count > 0 {
            QUERY_CACHE_EVENTS
                .with_label_values(&[self.name, "invalidate"])
                .inc_by(count as u64);
            debug!(cache = self.name, count, "query cache INVALIDATE ALL");
        }
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
