//! Cache Statistics Module
//!
//! Store-level inventory plus in-process hit/miss counters.

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of what the durable store currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of stored keys
    pub count: usize,
    /// Sum of serialized value lengths in bytes
    pub total_size_bytes: usize,
    /// Every stored key
    pub keys: Vec<String>,
}

impl CacheStats {
    /// Total size in kilobytes, for display.
    pub fn total_size_kb(&self) -> f64 {
        self.total_size_bytes as f64 / 1024.0
    }
}

// == Cache Counters ==
/// Tracks cache lookups made through one service since it was created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheCounters {
    /// Lookups answered from a valid envelope
    pub hits: u64,
    /// Lookups that found nothing usable (absent, expired or undecodable)
    pub misses: u64,
    /// Misses caused by an expired envelope
    pub expired: u64,
    /// Envelopes written
    pub writes: u64,
    /// Writes the store rejected
    pub write_failures: u64,
}

impl CacheCounters {
    // == Constructor ==
    /// Creates counters with everything at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Counts a lookup served from the cache.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Counts a lookup that found nothing usable.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Expired ==
    /// Counts an expired envelope, which is also a miss.
    pub fn record_expired(&mut self) {
        self.expired += 1;
        self.misses += 1;
    }

    // == Record Write ==
    /// Counts a cache write and whether the store accepted it.
    pub fn record_write(&mut self, ok: bool) {
        if ok {
            self.writes += 1;
        } else {
            self.write_failures += 1;
        }
    }
}
