//! In-memory TTL memoization for repeated identical queries
//!
//! A pure memoization layer: entries key on the full normalized request and
//! expire after a fixed interval. No cross-request locking beyond the map
//! itself; lookups never block on upstream calls.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<T> {
    stored_at: Instant,
    value: T,
}

/// A small keyed cache with per-cache time-to-live
pub struct TtlCache<T> {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a live entry; expired entries are dropped on access
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: &str, value: T) {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(
            key.to_string(),
            Entry {
                stored_at: Instant::now(),
                value,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_and_miss() {
        let cache = TtlCache::new(Duration::from_secs(60));
        assert!(cache.get("a").is_none());

        cache.insert("a", 1);
        assert_eq!(cache.get("a"), Some(1));
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let cache = TtlCache::new(Duration::ZERO);
        cache.insert("a", 1);
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_overwrites() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1);
        cache.insert("a", 2);
        assert_eq!(cache.get("a"), Some(2));
        assert_eq!(cache.len(), 1);
    }
}
