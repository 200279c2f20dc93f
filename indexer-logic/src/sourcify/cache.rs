//! In-memory TTL cache keyed by `(chain_id, normalized_address)`, backing
//! the Sourcify resolver. A `dashmap` concurrent map rather than a mutex:
//! the access pattern is a keyed point lookup/insert from many concurrent
//! pipeline tasks, which is exactly what `dashmap` is built for.

use std::time::{Duration, Instant};

use dashmap::DashMap;

struct Entry {
    abi: String,
    inserted_at: Instant,
}

pub struct AbiCache {
    ttl: Duration,
    entries: DashMap<(u32, String), Entry>,
}

impl AbiCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Returns the cached ABI if present and inserted less than `ttl` ago
    /// (P5: exactly `t' - t < TTL`, not `<=`).
    pub fn get(&self, chain_id: u32, address: &str) -> Option<String> {
        let key = (chain_id, address.to_string());
        let entry = self.entries.get(&key)?;
        if entry.inserted_at.elapsed() < self.ttl {
            Some(entry.abi.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, chain_id: u32, address: &str, abi: String) {
        self.entries.insert(
            (chain_id, address.to_string()),
            Entry {
                abi,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, chain_id: u32, address: &str) {
        self.entries.remove(&(chain_id, address.to_string()));
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_within_ttl_then_expires() {
        let cache = AbiCache::new(Duration::from_millis(20));
        cache.insert(1, "0xaaaa", "[]".to_string());
        assert_eq!(cache.get(1, "0xaaaa"), Some("[]".to_string()));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get(1, "0xaaaa"), None);
    }

    #[test]
    fn miss_for_unknown_key() {
        let cache = AbiCache::new(Duration::from_secs(60));
        assert_eq!(cache.get(1, "0xdead"), None);
    }

    #[test]
    fn invalidate_removes_one_entry() {
        let cache = AbiCache::new(Duration::from_secs(60));
        cache.insert(1, "0xaaaa", "[]".to_string());
        cache.insert(1, "0xbbbb", "[]".to_string());
        cache.invalidate(1, "0xaaaa");
        assert_eq!(cache.get(1, "0xaaaa"), None);
        assert_eq!(cache.get(1, "0xbbbb"), Some("[]".to_string()));
    }

    #[test]
    fn clear_removes_every_entry() {
        let cache = AbiCache::new(Duration::from_secs(60));
        cache.insert(1, "0xaaaa", "[]".to_string());
        cache.insert(2, "0xbbbb", "[]".to_string());
        cache.clear();
        assert_eq!(cache.get(1, "0xaaaa"), None);
        assert_eq!(cache.get(2, "0xbbbb"), None);
    }
}
