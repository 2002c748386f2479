//! Cache Statistics Module
//!
//! Point-in-time snapshot of the eviction cache.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats<K> {
    /// Number of live entries
    pub size: usize,
    /// Sum of the byte sizes of live entries
    pub byte_size: usize,
    /// Live keys in insertion order
    pub keys: Vec<K>,
    /// Entries removed by TTL expiry or LRU pressure since construction
    pub evictions: u64,
}

impl<K> CacheStats<K> {
    // == Average Entry Size ==
    /// Mean byte size per live entry, or 0.0 when empty.
    pub fn average_entry_size(&self) -> f64 {
        if self.size == 0 {
            0.0
        } else {
            self.byte_size as f64 / self.size as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_entry_size_empty() {
        let stats: CacheStats<String> = CacheStats {
            size: 0,
            byte_size: 0,
            keys: vec![],
            evictions: 0,
        };
        assert_eq!(stats.average_entry_size(), 0.0);
    }

    #[test]
    fn test_average_entry_size() {
        let stats = CacheStats {
            size: 2,
            byte_size: 30,
            keys: vec!["a", "b"],
            evictions: 1,
        };
        assert_eq!(stats.average_entry_size(), 15.0);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = CacheStats {
            size: 1,
            byte_size: 4,
            keys: vec!["job-1".to_string()],
            evictions: 0,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"byte_size\":4"));
        assert!(json.contains("job-1"));
    }
}
