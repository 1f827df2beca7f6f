//! TTL-bounded result caching.

use std::{hash::Hash, time::Duration};

use ahash::AHashMap;
// Paused-clock friendly: advances with tokio's test clock, wall time otherwise.
use tokio::time::Instant;

/// How long cached suggestion lists and resolved features stay valid.
pub const DEFAULT_TTL: Duration = Duration::from_millis(600_000);

/// Generic cache with lazy, read-time expiry.
///
/// Entries older than the TTL are ignored on read; nothing evicts them in the
/// background. Three independent instances back the pipeline: suggestion
/// lists and resolved features keyed by normalized query, and retrieved
/// features keyed by provider id.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: AHashMap<K, Entry<V>>,
    ttl: Duration,
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: AHashMap::new(),
            ttl,
        }
    }

    /// Fetch a live entry. Stale entries report a miss but are not removed.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
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

impl<K: Eq + Hash, V: Clone> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
