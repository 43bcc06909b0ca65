//! Time-expiring key/value cache
//!
//! Owned by the server and handed to whatever needs it. Entries expire after a
//! fixed TTL and are dropped on read or when a write finds them stale. The
//! number of keys is bounded; the least recently used key goes first.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Default time-to-live for cached values
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default number of keys kept
pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(n) => n,
    None => unreachable!(),
};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug)]
pub struct TtlCache<V: Clone> {
    ttl: Duration,
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: NonZeroUsize) -> Self {
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch a live value, removing it if it has expired
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        let now = Instant::now();
        let expired = entries.get(key)?.is_expired(now);
        if expired {
            entries.pop(key);
            return None;
        }
        entries.peek(key).map(|entry| entry.value.clone())
    }

    /// Store a value, sweeping expired entries and evicting the least
    /// recently used key when full
    pub fn set(&self, key: impl Into<String>, value: V) {
        let now = Instant::now();
        let entry = CacheEntry {
            value,
            expires_at: now + self.ttl,
        };
        let mut entries = self.lock();
        Self::remove_where(&mut entries, |_, e| e.is_expired(now));
        entries.push(key.into(), entry);
    }

    pub fn invalidate(&self, key: &str) {
        self.lock().pop(key);
    }

    /// Drop every key starting with `prefix`
    pub fn invalidate_prefix(&self, prefix: &str) {
        Self::remove_where(&mut self.lock(), |key, _| key.starts_with(prefix));
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.lock().cap()
    }

    fn remove_where(entries: &mut LruCache<String, CacheEntry<V>>, pred: impl Fn(&str, &CacheEntry<V>) -> bool) {
        // Collect first, the map cannot change while iterating
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(k, v)| pred(k, v))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry<V>>> {
        // A panic while holding the lock cannot leave a half-written entry
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
