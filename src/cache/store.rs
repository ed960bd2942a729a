// In-memory query cache.
// Stores the latest successful response per key, with staleness and invalidation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::key::CacheKey;

/// Default time a cached result is served without refetching: 5 minutes.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Default time an entry is kept before it is garbage-collected: 5 minutes.
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(5 * 60);

/// Wrapper for cached data with metadata.
#[derive(Debug, Clone)]
pub struct CachedData<T> {
    /// The cached data.
    pub data: T,
    /// When the data was cached.
    pub cached_at: DateTime<Utc>,
    /// Last time the data was written or served fresh.
    pub used_at: DateTime<Utc>,
    /// Set by invalidation; forces the next read to refetch.
    pub invalidated: bool,
}

impl<T> CachedData<T> {
    /// Create a new cached data entry.
    pub fn new(data: T) -> Self {
        let now = Utc::now();
        Self {
            data,
            cached_at: now,
            used_at: now,
            invalidated: false,
        }
    }

    /// Time elapsed since the data was cached.
    pub fn age(&self) -> Duration {
        elapsed_since(self.cached_at)
    }

    /// Time elapsed since the data was last written or served.
    pub fn idle(&self) -> Duration {
        elapsed_since(self.used_at)
    }

    /// Check if this cached data is stale for the given stale time.
    pub fn is_stale(&self, stale_time: Duration) -> bool {
        self.invalidated || self.age() >= stale_time
    }
}

fn elapsed_since(at: DateTime<Utc>) -> Duration {
    Utc::now()
        .signed_duration_since(at)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Shared cache of query results. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    entries: Arc<RwLock<HashMap<CacheKey, CachedData<Value>>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, CachedData<Value>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, CachedData<Value>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached value for `key` if it is still fresh. A hit counts as a use.
    pub fn get_fresh(&self, key: &CacheKey, stale_time: Duration) -> Option<Value> {
        let mut entries = self.write();
        let entry = entries
            .get_mut(key)
            .filter(|entry| !entry.is_stale(stale_time))?;
        entry.used_at = Utc::now();
        Some(entry.data.clone())
    }

    /// Last stored value for `key`, regardless of staleness.
    pub fn get_query_data(&self, key: &CacheKey) -> Option<Value> {
        self.read().get(key).map(|entry| entry.data.clone())
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set_query_data(&self, key: CacheKey, value: Value) {
        self.write().insert(key, CachedData::new(value));
    }

    /// Mark every entry whose key starts with `prefix` as stale.
    /// Returns how many entries were marked.
    pub fn invalidate(&self, prefix: &CacheKey) -> usize {
        let mut entries = self.write();
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                count += 1;
            }
        }
        tracing::debug!(prefix = %prefix, count, "invalidated queries");
        count
    }

    /// Remove the entry for `key`.
    pub fn remove(&self, key: &CacheKey) -> Option<Value> {
        self.write().remove(key).map(|entry| entry.data)
    }

    /// Drop entries unused for at least `gc_time`. Returns how many were dropped.
    pub fn prune(&self, gc_time: Duration) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.idle() < gc_time);
        let dropped = before - entries.len();
        if dropped > 0 {
            tracing::debug!(dropped, "pruned idle queries");
        }
        dropped
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backdate(cache: &QueryCache, key: &CacheKey, seconds: i64) {
        let mut entries = cache.write();
        let entry = entries.get_mut(key).unwrap();
        entry.cached_at = Utc::now() - chrono::Duration::seconds(seconds);
        entry.used_at = entry.cached_at;
    }

    #[test]
    fn test_set_and_get() {
        let cache = QueryCache::new();
        let key = CacheKey::from("items");

        cache.set_query_data(key.clone(), json!({"id": 1}));

        assert_eq!(cache.get_query_data(&key), Some(json!({"id": 1})));
        assert_eq!(
            cache.get_fresh(&key, DEFAULT_STALE_TIME),
            Some(json!({"id": 1}))
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_entry_goes_stale() {
        let cache = QueryCache::new();
        let key = CacheKey::from("items");
        cache.set_query_data(key.clone(), json!([1, 2]));

        backdate(&cache, &key, 600);

        assert!(cache.get_fresh(&key, Duration::from_secs(300)).is_none());
        // Stale data is still readable directly
        assert_eq!(cache.get_query_data(&key), Some(json!([1, 2])));
    }

    #[test]
    fn test_zero_stale_time_always_stale() {
        let data = CachedData::new("x");
        assert!(data.is_stale(Duration::ZERO));
    }

    #[test]
    fn test_invalidate_by_prefix() {
        let cache = QueryCache::new();
        cache.set_query_data(CacheKey::from(["items", "1"]), json!(1));
        cache.set_query_data(CacheKey::from(["items", "2"]), json!(2));
        cache.set_query_data(CacheKey::from("users"), json!(3));

        assert_eq!(cache.invalidate(&CacheKey::from("items")), 2);

        assert!(
            cache
                .get_fresh(&CacheKey::from(["items", "1"]), DEFAULT_STALE_TIME)
                .is_none()
        );
        assert!(
            cache
                .get_fresh(&CacheKey::from("users"), DEFAULT_STALE_TIME)
                .is_some()
        );

        // Writing fresh data clears the invalidated flag
        cache.set_query_data(CacheKey::from(["items", "1"]), json!(10));
        assert_eq!(
            cache.get_fresh(&CacheKey::from(["items", "1"]), DEFAULT_STALE_TIME),
            Some(json!(10))
        );
    }

    #[test]
    fn test_invalidate_ignores_integer_type() {
        let cache = QueryCache::new();
        cache.set_query_data(CacheKey::from("items").with(1u64), json!("one"));

        assert_eq!(cache.invalidate(&CacheKey::from("items").with(1)), 1);
        assert!(
            cache
                .get_fresh(&CacheKey::from("items").with(1u32), DEFAULT_STALE_TIME)
                .is_none()
        );

        // Same key, whichever integer type wrote it
        cache.set_query_data(CacheKey::from("items").with(1i64), json!("uno"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_prune_drops_old_entries() {
        let cache = QueryCache::new();
        let old = CacheKey::from("old");
        let new = CacheKey::from("new");
        cache.set_query_data(old.clone(), json!(null));
        cache.set_query_data(new.clone(), json!(null));
        backdate(&cache, &old, 3600);

        assert_eq!(cache.prune(Duration::from_secs(300)), 1);
        assert!(cache.get_query_data(&old).is_none());
        assert!(cache.get_query_data(&new).is_some());
    }

    #[test]
    fn test_fresh_hit_keeps_entry_alive() {
        let cache = QueryCache::new();
        let key = CacheKey::from("hot");
        cache.set_query_data(key.clone(), json!(1));
        backdate(&cache, &key, 600);

        // Stale for a short stale time, but still served under a long one
        assert!(cache.get_fresh(&key, Duration::from_secs(3600)).is_some());

        assert_eq!(cache.prune(Duration::from_secs(300)), 0);
        assert!(cache.get_query_data(&key).is_some());
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = QueryCache::new();
        let shared = cache.clone();
        cache.set_query_data(CacheKey::from("a"), json!("a"));
        cache.set_query_data(CacheKey::from("b"), json!("b"));

        assert_eq!(shared.remove(&CacheKey::from("a")), Some(json!("a")));
        assert_eq!(cache.len(), 1);

        shared.clear();
        assert!(cache.is_empty());
    }
}
