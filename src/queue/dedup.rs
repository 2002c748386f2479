//! Deduplication Map
//!
//! TTL-only map from content key to the first value seen for that key.

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct DedupEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> DedupEntry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

// == Dedup Cache ==
/// Time-boxed content-keyed cache backing queue coalescing.
#[derive(Debug)]
pub struct DedupCache<T> {
    entries: HashMap<String, DedupEntry<T>>,
    ttl: Duration,
}

impl<T: Clone> DedupCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Returns the cached value for `key` while it is still live.
    pub fn get(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(Instant::now()))
            .map(|entry| entry.value.clone())
    }

    /// Stores `value` under `key` for one TTL, then purges expired entries.
    pub fn insert(&mut self, key: String, value: T) {
        let now = Instant::now();
        self.entries.insert(
            key,
            DedupEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
        self.purge_expired(now);
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_dedup_get_live_entry() {
        let mut cache = DedupCache::new(Duration::from_secs(5));
        cache.insert("k".to_string(), 1);

        assert_eq!(cache.get("k"), Some(1));
        assert_eq!(cache.get("other"), None);
    }

    #[test]
    fn test_dedup_entry_expires() {
        let mut cache = DedupCache::new(Duration::from_millis(20));
        cache.insert("k".to_string(), 1);

        sleep(Duration::from_millis(40));

        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_dedup_insert_purges_other_expired() {
        let mut cache = DedupCache::new(Duration::from_millis(20));
        cache.insert("old".to_string(), 1);

        sleep(Duration::from_millis(40));
        cache.insert("new".to_string(), 2);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("new"), Some(2));
    }

    #[test]
    fn test_dedup_clear() {
        let mut cache = DedupCache::new(Duration::from_secs(5));
        cache.insert("a".to_string(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
