//! # Route Cache
//!
//! Memoization for built routes: least-recently-used eviction plus a TTL
//! window, so identical waypoint sets never re-issue directions calls while
//! the entry is fresh.
//!
//! For the capacities involved (a handful of tours on screen), the linear
//! scan for eviction is acceptable and simpler than maintaining a linked
//! list.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::{GpsPoint, Route};

/// Default number of cached routes.
pub const DEFAULT_CAPACITY: usize = 16;

/// Default freshness window for a cached route.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    route: Route,
    inserted_at: Instant,
    last_access: u64,
}

/// An LRU + TTL cache of built routes, keyed by the waypoint set.
#[derive(Debug)]
pub struct RouteCache {
    capacity: usize,
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
    access_counter: u64,
}

impl RouteCache {
    /// Create a cache with the given capacity and freshness window.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            entries: HashMap::with_capacity(capacity.max(1)),
            access_counter: 0,
        }
    }

    /// Cache key for an ordered waypoint set: the concatenated coordinates.
    ///
    /// Any change to the set (order, membership, position) produces a new key
    /// and therefore a rebuild.
    pub fn key_for(points: &[GpsPoint]) -> String {
        points
            .iter()
            .map(|p| format!("{},{}", p.latitude, p.longitude))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Get a fresh route from the cache, updating its access time.
    ///
    /// Entries older than the TTL are dropped on access and `None` is
    /// returned.
    pub fn get(&mut self, key: &str) -> Option<Route> {
        let stale = match self.entries.get(key) {
            Some(entry) => entry.inserted_at.elapsed() >= self.ttl,
            None => return None,
        };

        if stale {
            self.entries.remove(key);
            return None;
        }

        self.access_counter += 1;
        let entry = self.entries.get_mut(key)?;
        entry.last_access = self.access_counter;
        Some(entry.route.clone())
    }

    /// Insert a route, evicting the least recently used entry if at capacity.
    pub fn insert(&mut self, key: String, route: Route) {
        self.access_counter += 1;

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.route = route;
            entry.inserted_at = Instant::now();
            entry.last_access = self.access_counter;
            return;
        }

        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        self.entries.insert(
            key,
            CacheEntry {
                route,
                inserted_at: Instant::now(),
                last_access: self.access_counter,
            },
        );
    }

    /// Remove a specific key from the cache.
    pub fn invalidate(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Clear all entries from the cache.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.access_counter = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&mut self) {
        let oldest_key = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(k, _)| k.clone());

        if let Some(key) = oldest_key {
            self.entries.remove(&key);
        }
    }
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
