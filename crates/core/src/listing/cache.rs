//! Time-bounded, size-bounded cache with an injectable clock.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
    last_used: u64,
}

/// Key/value cache where each entry lives for a fixed TTL and the least
/// recently used entry is evicted once `capacity` is reached.
///
/// The cache never reads the clock itself; callers pass `now` so tests can
/// drive expiry deterministically.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, Entry<V>>,
    ttl: Duration,
    capacity: usize,
    tick: u64,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity: capacity.max(1),
            tick: 0,
        }
    }

    /// Return a live entry, dropping it if it has expired.
    pub fn get(&mut self, key: &K, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => now >= entry.expires_at,
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }

        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(key).map(|entry| {
            entry.last_used = tick;
            entry.value.clone()
        })
    }

    /// Insert or replace an entry, evicting as needed to stay within capacity.
    pub fn insert(&mut self, key: K, value: V, now: Instant) {
        self.entries.retain(|_, entry| now < entry.expires_at);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
            }
        }

        self.tick += 1;
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at: now + self.ttl,
                last_used: self.tick,
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
