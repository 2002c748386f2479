//! Eviction Cache Module
//!
//! Bounded key-value store combining entry-count, byte-size and TTL limits
//! with least-recently-used eviction.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::options::{EvictFn, SizeFn};
use crate::cache::{CacheEntry, CacheOptions, CacheStats, InsertionOrder};
use crate::error::Result;

// == Cache State ==
/// Mutable part of the cache, guarded by one mutex.
#[derive(Debug)]
struct CacheState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    order: InsertionOrder<K>,
    /// Always equals the sum of `size` over `entries`
    byte_size: usize,
    evictions: u64,
}

impl<K, V> CacheState<K, V>
where
    K: Eq + Hash + Clone,
{
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            byte_size: 0,
            evictions: 0,
        }
    }

    fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (key, entry) = self.entries.remove_entry(key)?;
        self.order.remove::<K>(&key);
        self.byte_size -= entry.size;
        Some((key, entry.value))
    }

    /// Key with the oldest `last_access`; ties go to the earliest insertion.
    fn least_recent(&self) -> Option<K> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).map(|entry| (key, entry.last_access)))
            .min_by_key(|(_, last_access)| *last_access)
            .map(|(key, _)| key.clone())
    }

    fn expired_keys(&self, ttl: Option<Duration>) -> Vec<K> {
        if ttl.is_none() {
            return Vec::new();
        }
        self.order
            .iter()
            .filter(|key| {
                self.entries
                    .get(*key)
                    .map_or(false, |entry| entry.is_expired(ttl))
            })
            .cloned()
            .collect()
    }
}

// == Eviction Cache ==
/// Thread-safe bounded cache with TTL, LRU and byte-budget eviction.
///
/// All methods take `&self`; the eviction callback runs after the internal
/// lock is released, so it may call back into the cache.
pub struct EvictionCache<K, V> {
    state: Mutex<CacheState<K, V>>,
    max_entries: Option<usize>,
    ttl: Option<Duration>,
    max_bytes: Option<usize>,
    size_of: Option<SizeFn<V>>,
    on_evict: Option<EvictFn<K, V>>,
}

impl<K, V> EvictionCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates a cache from validated options.
    pub fn new(options: CacheOptions<K, V>) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            state: Mutex::new(CacheState::new()),
            max_entries: options.max_entries,
            ttl: options.ttl,
            max_bytes: options.max_bytes,
            size_of: options.size_of,
            on_evict: options.on_evict,
        })
    }

    /// Creates a cache with no limits at all.
    pub fn unbounded() -> Self {
        Self {
            state: Mutex::new(CacheState::new()),
            max_entries: None,
            ttl: None,
            max_bytes: None,
            size_of: None,
            on_evict: None,
        }
    }

    // == Get ==
    /// Returns the value and refreshes its recency.
    ///
    /// An expired entry is evicted (firing `on_evict`) and reported absent.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup(key, true)
    }

    // == Has ==
    /// Reports presence without refreshing recency. Expired entries are still
    /// evicted.
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup(key, false).is_some()
    }

    // == Peek ==
    /// Returns the raw stored value, ignoring TTL and leaving recency as is.
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let state = self.state.lock();
        state.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Set ==
    /// Stores a value, evicting as needed to honour the limits.
    ///
    /// Overwriting a key first releases the old value's bytes; the key keeps
    /// its original insertion position. Expired entries are swept next, then
    /// least-recently-used entries are evicted while the entry cap is reached
    /// or the new value would exceed the byte budget.
    pub fn set(&self, key: K, value: V) {
        let size = self.size_of(&value);
        let mut evicted = Vec::new();

        {
            let mut guard = self.state.lock();
            let state = &mut *guard;

            let existed = match state.entries.remove(&key) {
                Some(old) => {
                    state.byte_size -= old.size;
                    true
                }
                None => false,
            };

            for expired in state.expired_keys(self.ttl) {
                if let Some(pair) = state.remove(&expired) {
                    state.evictions += 1;
                    evicted.push(pair);
                }
            }

            while !state.entries.is_empty() && self.over_budget(state, size) {
                let Some(victim) = state.least_recent() else {
                    break;
                };
                if let Some(pair) = state.remove(&victim) {
                    state.evictions += 1;
                    evicted.push(pair);
                }
            }

            if !existed {
                state.order.push(key.clone());
            }
            state.entries.insert(key, CacheEntry::new(value, size));
            state.byte_size += size;
        }

        if !evicted.is_empty() {
            debug!(count = evicted.len(), "cache evicted entries on set");
        }
        self.notify(evicted);
    }

    // == Delete ==
    /// Removes an entry, firing `on_evict`. Returns whether it existed.
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.state.lock().remove(key);
        let existed = removed.is_some();
        self.notify(removed);
        existed
    }

    // == Clear ==
    /// Fires `on_evict` for every entry, then leaves the cache empty.
    pub fn clear(&self) {
        let drained: Vec<(K, V)> = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let keys = state.order.drain();
            let mut entries = std::mem::take(&mut state.entries);
            state.byte_size = 0;
            keys.into_iter()
                .filter_map(|key| entries.remove(&key).map(|entry| (key, entry.value)))
                .collect()
        };
        self.notify(drained);
    }

    // == Stats ==
    /// O(n) snapshot; keys are listed in insertion order.
    pub fn stats(&self) -> CacheStats<K> {
        let state = self.state.lock();
        CacheStats {
            size: state.entries.len(),
            byte_size: state.byte_size,
            keys: state.order.iter().cloned().collect(),
            evictions: state.evictions,
        }
    }

    // == Length ==
    /// Returns the number of live entries, expired or not.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    // == Byte Size ==
    /// Returns the running byte total.
    pub fn byte_size(&self) -> usize {
        self.state.lock().byte_size
    }

    fn lookup<Q>(&self, key: &Q, refresh: bool) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let expired = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let entry = state.entries.get_mut(key)?;
            if !entry.is_expired(self.ttl) {
                if refresh {
                    entry.touch();
                }
                return Some(entry.value.clone());
            }
            let removed = state.remove(key);
            if removed.is_some() {
                state.evictions += 1;
            }
            removed
        };

        debug!("cache entry expired on lookup");
        self.notify(expired);
        None
    }

    fn over_budget(&self, state: &CacheState<K, V>, incoming: usize) -> bool {
        let over_count = self
            .max_entries
            .map_or(false, |max| state.entries.len() >= max);
        let over_bytes = self
            .max_bytes
            .map_or(false, |max| state.byte_size + incoming > max);
        over_count || over_bytes
    }

    fn size_of(&self, value: &V) -> usize {
        self.size_of.as_ref().map_or(0, |size_of| size_of(value))
    }

    fn notify(&self, removed: impl IntoIterator<Item = (K, V)>) {
        if let Some(on_evict) = &self.on_evict {
            for (key, value) in removed {
                on_evict(&key, &value);
            }
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, OnceLock};
    use std::thread::sleep;

    fn cache(max_entries: usize) -> EvictionCache<String, String> {
        EvictionCache::new(CacheOptions::new().max_entries(max_entries)).unwrap()
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, CacheOptions<String, String>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let opts = CacheOptions::new().on_evict(move |k: &String, _v: &String| {
            sink.lock().push(k.clone());
        });
        (log, opts)
    }

    #[test]
    fn test_cache_new() {
        let cache = cache(10);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.byte_size(), 0);
    }

    #[test]
    fn test_cache_invalid_options() {
        let result: Result<EvictionCache<String, String>> =
            EvictionCache::new(CacheOptions::new().max_entries(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_set_and_get() {
        let cache = cache(10);

        cache.set("key1".to_string(), "value1".to_string());

        assert_eq!(cache.get("key1"), Some("value1".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_get_nonexistent() {
        let cache = cache(10);
        assert_eq!(cache.get("nonexistent"), None);
    }

    #[test]
    fn test_cache_delete() {
        let (log, opts) = recorder();
        let cache = EvictionCache::new(opts).unwrap();

        cache.set("key1".to_string(), "value1".to_string());

        assert!(cache.delete("key1"));
        assert!(!cache.delete("key1"));
        assert!(cache.is_empty());
        assert_eq!(*log.lock(), vec!["key1".to_string()]);
    }

    #[test]
    fn test_cache_overwrite_does_not_double_count() {
        let cache: EvictionCache<String, String> =
            EvictionCache::new(CacheOptions::new().size_of(|v: &String| v.len())).unwrap();

        cache.set("key".to_string(), "four".to_string());
        cache.set("key".to_string(), "sixsix".to_string());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.byte_size(), 6);
        assert_eq!(cache.get("key"), Some("sixsix".to_string()));
    }

    #[test]
    fn test_cache_overwrite_does_not_fire_on_evict() {
        let (log, opts) = recorder();
        let cache = EvictionCache::new(opts).unwrap();

        cache.set("key".to_string(), "a".to_string());
        cache.set("key".to_string(), "b".to_string());

        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_cache_overwrite_keeps_insertion_position() {
        let cache = cache(3);

        cache.set("a".to_string(), "1".to_string());
        cache.set("b".to_string(), "2".to_string());
        cache.set("a".to_string(), "3".to_string());

        assert_eq!(cache.stats().keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cache.peek("a"), Some("3".to_string()));
    }

    #[test]
    fn test_cache_remove_by_borrowed_key() {
        let (log, opts) = recorder();
        let cache = EvictionCache::new(opts).unwrap();

        cache.set("key".to_string(), "value".to_string());
        let borrowed: &str = "key";

        assert!(cache.delete(borrowed));
        assert!(cache.stats().keys.is_empty());
        assert_eq!(*log.lock(), vec!["key".to_string()]);
    }

    #[test]
    fn test_cache_lru_eviction() {
        let cache = cache(3);

        cache.set("key1".to_string(), "value1".to_string());
        cache.set("key2".to_string(), "value2".to_string());
        cache.set("key3".to_string(), "value3".to_string());

        // Cache is full, adding key4 should evict key1 (oldest)
        cache.set("key4".to_string(), "value4".to_string());

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.peek("key1"), None);
        assert!(cache.has("key2"));
        assert!(cache.has("key3"));
        assert!(cache.has("key4"));
    }

    #[test]
    fn test_cache_lru_touch_on_get() {
        let cache = cache(3);

        cache.set("key1".to_string(), "value1".to_string());
        cache.set("key2".to_string(), "value2".to_string());
        cache.set("key3".to_string(), "value3".to_string());

        // Access key1 to make it most recently used
        sleep(Duration::from_millis(1));
        cache.get("key1");

        // Adding key4 should evict key2 (now least recent)
        cache.set("key4".to_string(), "value4".to_string());

        assert!(cache.has("key1"));
        assert!(!cache.has("key2"));
    }

    #[test]
    fn test_cache_has_does_not_refresh_recency() {
        let cache = cache(2);

        cache.set("a".to_string(), "1".to_string());
        cache.set("b".to_string(), "2".to_string());

        sleep(Duration::from_millis(1));
        assert!(cache.has("a"));

        cache.set("c".to_string(), "3".to_string());

        assert_eq!(cache.peek("a"), None);
        assert!(cache.has("b"));
    }

    #[test]
    fn test_cache_byte_budget_eviction() {
        let cache: EvictionCache<String, String> = EvictionCache::new(
            CacheOptions::new()
                .max_bytes(10)
                .size_of(|v: &String| v.len()),
        )
        .unwrap();

        cache.set("a".to_string(), "xxxx".to_string());
        cache.set("b".to_string(), "xxxx".to_string());
        // 8 + 4 > 10, evicts "a"
        cache.set("c".to_string(), "xxxx".to_string());

        assert_eq!(cache.byte_size(), 8);
        assert_eq!(cache.peek("a"), None);
        assert_eq!(cache.stats().keys, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_cache_oversized_value_still_inserted() {
        let cache: EvictionCache<String, String> = EvictionCache::new(
            CacheOptions::new()
                .max_bytes(3)
                .size_of(|v: &String| v.len()),
        )
        .unwrap();

        cache.set("a".to_string(), "xx".to_string());
        cache.set("b".to_string(), "xxxxxx".to_string());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.byte_size(), 6);
    }

    #[test]
    fn test_cache_ttl_expiration_evicts() {
        let (log, opts) = recorder();
        let cache = EvictionCache::new(opts.ttl(Duration::from_millis(30))).unwrap();

        cache.set("key1".to_string(), "value1".to_string());
        assert!(cache.get("key1").is_some());

        sleep(Duration::from_millis(60));

        assert_eq!(cache.get("key1"), None);
        assert_eq!(cache.peek("key1"), None);
        assert_eq!(*log.lock(), vec!["key1".to_string()]);
    }

    #[test]
    fn test_cache_has_evicts_expired() {
        let cache: EvictionCache<String, String> =
            EvictionCache::new(CacheOptions::new().ttl(Duration::from_millis(20))).unwrap();

        cache.set("key".to_string(), "value".to_string());
        sleep(Duration::from_millis(40));

        assert!(!cache.has("key"));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_cache_peek_ignores_ttl() {
        let cache: EvictionCache<String, String> =
            EvictionCache::new(CacheOptions::new().ttl(Duration::from_millis(20))).unwrap();

        cache.set("key".to_string(), "value".to_string());
        sleep(Duration::from_millis(40));

        assert_eq!(cache.peek("key"), Some("value".to_string()));
    }

    #[test]
    fn test_cache_set_sweeps_expired() {
        let cache: EvictionCache<String, String> =
            EvictionCache::new(CacheOptions::new().ttl(Duration::from_millis(20))).unwrap();

        cache.set("old".to_string(), "value".to_string());
        sleep(Duration::from_millis(40));
        cache.set("new".to_string(), "value".to_string());

        assert_eq!(cache.stats().keys, vec!["new".to_string()]);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_cache_clear_fires_for_every_entry() {
        let (log, opts) = recorder();
        let cache = EvictionCache::new(opts.size_of(|v: &String| v.len())).unwrap();

        cache.set("a".to_string(), "1".to_string());
        cache.set("b".to_string(), "22".to_string());
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.byte_size(), 0);
        assert_eq!(*log.lock(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_cache_on_evict_may_reenter() {
        let slot: Arc<OnceLock<Arc<EvictionCache<String, String>>>> = Arc::new(OnceLock::new());
        let inner = Arc::clone(&slot);
        let cache = Arc::new(
            EvictionCache::new(CacheOptions::new().max_entries(1).on_evict(
                move |k: &String, _v: &String| {
                    if let Some(cache) = inner.get() {
                        if k == "a" {
                            cache.set("evicted".to_string(), k.clone());
                        }
                    }
                },
            ))
            .unwrap(),
        );
        let _ = slot.set(Arc::clone(&cache));

        cache.set("a".to_string(), "1".to_string());
        cache.set("b".to_string(), "2".to_string());

        assert_eq!(cache.peek("evicted"), Some("a".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_stats_idempotent() {
        let cache = cache(10);
        cache.set("a".to_string(), "1".to_string());

        assert_eq!(cache.stats(), cache.stats());
    }
}
