//! Bounded result cache keyed by content fingerprint.
//!
//! Entries are evicted strictly in insertion order (FIFO). The store is an
//! [`lru::LruCache`] that is only ever read with `peek` and only written for
//! new keys, so its recency order never diverges from insertion order and a
//! popular image still ages out once `capacity` newer fingerprints arrive.
//!
//! One mutex guards the whole state. `put` holds it across the presence
//! check, the insert and the eviction, so concurrent requests can never push
//! the cache past its capacity.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use canonical::Fingerprint;
use lru::LruCache;
use serde::Serialize;
use tracing::debug;

/// Number of results the gateway keeps.
pub const CACHE_CAPACITY: usize = 100;

/// One cached recognition result. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    pub text: String,
    pub confidence: f64,
    /// Monotonic insertion number; the smallest live one is evicted first.
    pub sequence: u64,
}

#[derive(Debug)]
struct CacheState {
    /// `None` when the cache was built with zero capacity.
    entries: Option<LruCache<Fingerprint, CacheEntry>>,
    next_sequence: u64,
}

/// Thread-safe FIFO cache of normalized OCR results.
#[derive(Debug)]
pub struct ResultCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CACHE_CAPACITY)
    }
}

impl ResultCache {
    /// A cache holding at most `capacity` entries. Zero disables storage.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState {
                entries: NonZeroUsize::new(capacity).map(LruCache::new),
                next_sequence: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a fingerprint. Never changes eviction order.
    pub fn get(&self, key: &Fingerprint) -> Option<CacheEntry> {
        self.lock().entries.as_ref()?.peek(key).cloned()
    }

    /// Store a result unless the fingerprint is already present.
    ///
    /// Returns the entry now held for `key`: the existing one when present,
    /// otherwise the new one. Inserting past capacity evicts the oldest entry.
    pub fn put(&self, key: Fingerprint, text: String, confidence: f64) -> CacheEntry {
        let mut state = self.lock();
        if let Some(existing) = state.entries.as_ref().and_then(|entries| entries.peek(&key)) {
            return existing.clone();
        }

        let entry = CacheEntry {
            text,
            confidence,
            sequence: state.next_sequence,
        };
        state.next_sequence += 1;

        let Some(entries) = state.entries.as_mut() else {
            return entry;
        };
        // `key` is absent, so a returned pair is always an eviction.
        if let Some((evicted, _)) = entries.push(key, entry.clone()) {
            debug!(fingerprint = %evicted.short(), "cache_eviction");
        }
        entry
    }

    pub fn contains(&self, key: &Fingerprint) -> bool {
        self.lock()
            .entries
            .as_ref()
            .is_some_and(|entries| entries.contains(key))
    }

    pub fn len(&self) -> usize {
        self.lock().entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
