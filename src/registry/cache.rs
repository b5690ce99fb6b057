//! In-process TTL cache for registry lookups that repeat within a batch
//!
//! Keyed by URL. Concurrent writers racing on the same key are fine: the last
//! write wins and every writer stores the same upstream data.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Time source, replaceable in tests
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    offset_ms: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Read-mostly cache with a fixed time-to-live
pub struct TtlCache<V> {
    entries: DashMap<String, Entry<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Returns the cached value unless it has expired
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let entry = self.entries.get(key)?;
        if now.duration_since(entry.stored_at) < self.ttl {
            Some(entry.value.clone())
        } else {
            drop(entry);
            self.entries.remove(key);
            None
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.entries.insert(
            key.into(),
            Entry {
                value,
                stored_at: self.clock.now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_ttl() {
        let cache = TtlCache::new(Duration::from_secs(600));
        cache.insert("https://api.nuget.org/v3/index.json", "feed".to_string());
        assert_eq!(
            cache.get("https://api.nuget.org/v3/index.json").as_deref(),
            Some("feed")
        );
        assert!(cache.get("other").is_none());
    }

    #[test]
    fn test_expires_after_ttl() {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::with_clock(Duration::from_secs(600), clock.clone());
        cache.insert("key", 1);

        clock.advance(Duration::from_secs(599));
        assert_eq!(cache.get("key"), Some(1));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("key"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("key", 1);
        cache.insert("key", 2);
        assert_eq!(cache.get("key"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_reinsert_refreshes_age() {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::with_clock(Duration::from_secs(10), clock.clone());
        cache.insert("key", "a");
        clock.advance(Duration::from_secs(8));
        cache.insert("key", "b");
        clock.advance(Duration::from_secs(8));
        assert_eq!(cache.get("key"), Some("b"));
    }
}
