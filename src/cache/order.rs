//! Insertion Order Module
//!
//! Remembers the order in which live keys were inserted into the cache.

use std::borrow::Borrow;
use std::collections::VecDeque;

// == Insertion Order ==
/// Tracks live keys in insertion order.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest insertion
/// - Back = Newest insertion
///
/// This order is the tie-breaker for LRU victims with equal recency and the
/// order reported by `stats().keys`.
#[derive(Debug)]
pub struct InsertionOrder<K> {
    order: VecDeque<K>,
}

impl<K> Default for InsertionOrder<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> InsertionOrder<K> {
    // == Constructor ==
    /// Creates a new empty order tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Push ==
    /// Records a newly inserted key at the back.
    pub fn push(&mut self, key: K) {
        self.order.push_back(key);
    }

    // == Remove ==
    /// Forgets a key.
    pub fn remove<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        if let Some(pos) = self.order.iter().position(|k| k.borrow() == key) {
            self.order.remove(pos);
        }
    }

    // == Iter ==
    /// Iterates keys from oldest to newest insertion.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    // == Drain ==
    /// Removes and returns every key, oldest first.
    pub fn drain(&mut self) -> Vec<K> {
        self.order.drain(..).collect()
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn keys(order: &InsertionOrder<String>) -> Vec<&str> {
        order.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_order_new() {
        let order: InsertionOrder<String> = InsertionOrder::new();
        assert!(order.is_empty());
        assert_eq!(order.len(), 0);
    }

    #[test]
    fn test_order_push_keeps_insertion_order() {
        let mut order = InsertionOrder::new();

        order.push("a".to_string());
        order.push("b".to_string());
        order.push("c".to_string());

        assert_eq!(keys(&order), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_order_remove_middle() {
        let mut order = InsertionOrder::new();

        order.push("a".to_string());
        order.push("b".to_string());
        order.push("c".to_string());
        order.remove("b");

        assert_eq!(keys(&order), vec!["a", "c"]);
    }

    #[test]
    fn test_order_remove_nonexistent_key() {
        let mut order = InsertionOrder::new();

        order.push("a".to_string());
        order.remove("missing");

        assert_eq!(order.len(), 1);
    }

    #[test]
    fn test_order_reinsert_moves_to_back() {
        let mut order = InsertionOrder::new();

        order.push("a".to_string());
        order.push("b".to_string());
        order.remove("a");
        order.push("a".to_string());

        assert_eq!(keys(&order), vec!["b", "a"]);
    }

    #[test]
    fn test_order_drain() {
        let mut order = InsertionOrder::new();

        order.push(1);
        order.push(2);

        assert_eq!(order.drain(), vec![1, 2]);
        assert!(order.is_empty());
    }
}
