//! Stale-while-revalidate page cache
//!
//! Detail pages are rendered once and then served from a moka cache. An
//! entry older than the revalidation window is still served, but the read
//! that notices it is stale starts one background refresh that replaces the
//! entry when it completes. Entries never expire on their own; moka only
//! bounds how many are kept.

use moka::future::Cache;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Default cache capacity (number of pages).
pub const DEFAULT_CAPACITY: u64 = 1000;

/// A cached value and when it was computed
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub computed_at: Instant,
    /// A background refresh for this entry is in flight
    ///
    /// Shared by every clone handed out by the cache.
    pub refreshing: Arc<AtomicBool>,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, computed_at: Instant) -> Self {
        Self {
            value,
            computed_at,
            refreshing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Older than `window` at `now`
    pub fn is_stale(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.computed_at) > window
    }
}

/// Outcome of a load for the cache's purposes
pub enum Loaded<V, E> {
    /// Store the value and serve it
    Value(V),
    /// The key no longer exists; evict any entry
    Gone,
    /// Loading failed; keep whatever is cached
    Failed(E),
}

impl<V, E> From<Result<Option<V>, E>> for Loaded<V, E> {
    fn from(result: Result<Option<V>, E>) -> Self {
        match result {
            Ok(Some(v)) => Loaded::Value(v),
            Ok(None) => Loaded::Gone,
            Err(e) => Loaded::Failed(e),
        }
    }
}

/// Why a miss produced no entry
#[derive(Debug)]
enum Miss<E> {
    Gone,
    Failed(Arc<E>),
}

/// Keyed page cache with a fixed revalidation window
#[derive(Clone)]
pub struct PageCache<K, V> {
    entries: Cache<K, CacheEntry<V>>,
    window: Duration,
}

impl<K, V> PageCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(window: Duration) -> Self {
        Self::with_capacity(window, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(window: Duration, capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Store a freshly computed value
    pub async fn insert(&self, key: K, value: V) {
        self.entries
            .insert(key, CacheEntry::new(value, Instant::now()))
            .await;
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Get the cached value for `key`, computing it with `load` on a miss
    ///
    /// - miss: `load` runs in the caller's task and its value is cached;
    ///   concurrent misses on one key share a single load
    /// - fresh hit: `load` is dropped unused
    /// - stale hit: the stale value is returned and `load` runs in a spawned
    ///   task unless a refresh is already in flight
    ///
    /// Returns `Ok(None)` when the key does not exist.
    pub async fn get_or_load<F, Fut, E>(&self, key: K, load: F) -> Result<Option<V>, Arc<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<V>, E>> + Send + 'static,
        E: std::fmt::Display + Send + Sync + 'static,
    {
        if let Some(entry) = self.entries.get(&key).await {
            if entry.is_stale(Instant::now(), self.window)
                && !entry.refreshing.swap(true, Ordering::SeqCst)
            {
                tracing::debug!(key = ?key, "serving stale entry, revalidating");
                self.spawn_refresh(key, entry.refreshing.clone(), load);
            }
            return Ok(Some(entry.value));
        }

        let init = async move {
            tracing::debug!("cache miss, rendering");
            match Loaded::from(load().await) {
                Loaded::Value(value) => Ok(CacheEntry::new(value, Instant::now())),
                Loaded::Gone => Err(Miss::Gone),
                Loaded::Failed(e) => Err(Miss::Failed(Arc::new(e))),
            }
        };

        match self.entries.try_get_with(key, init).await {
            Ok(entry) => Ok(Some(entry.value)),
            Err(miss) => match &*miss {
                Miss::Gone => Ok(None),
                Miss::Failed(e) => Err(Arc::clone(e)),
            },
        }
    }

    fn spawn_refresh<F, Fut, E>(&self, key: K, refreshing: Arc<AtomicBool>, load: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<V>, E>> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        let entries = self.entries.clone();
        tokio::spawn(async move {
            match Loaded::from(load().await) {
                Loaded::Value(value) => {
                    entries
                        .insert(key.clone(), CacheEntry::new(value, Instant::now()))
                        .await;
                    tracing::debug!(key = ?key, "entry revalidated");
                }
                Loaded::Gone => {
                    entries.invalidate(&key).await;
                    tracing::info!(key = ?key, "entry no longer exists, evicted");
                }
                Loaded::Failed(e) => {
                    refreshing.store(false, Ordering::SeqCst);
                    tracing::warn!(key = ?key, error = %e, "revalidation failed, keeping stale entry");
                }
            }
        });
    }
}
