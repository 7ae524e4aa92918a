//! Cache Envelope Module
//!
//! Defines the persisted wrapper around a cached payload and its codec.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Envelope schema version written by this build
pub const ENVELOPE_VERSION: u32 = 1;

// == Clock ==
/// Source of the current instant in Unix milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for deterministic expiry.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(duration_ms(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

// == Cache Envelope ==
/// A cached payload with its creation and expiry instants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEnvelope<T> {
    /// The cached payload
    pub data: T,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: i64,
    /// Schema version, entries without one predate versioning
    #[serde(default = "legacy_version")]
    pub version: u32,
}

fn legacy_version() -> u32 {
    ENVELOPE_VERSION
}

impl<T> CacheEnvelope<T> {
    // == Constructor ==
    /// Wraps `data` so that it expires `ttl` after `now_ms`.
    pub fn new(data: T, now_ms: i64, ttl: Duration) -> Self {
        Self {
            data,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(duration_ms(ttl)),
            version: ENVELOPE_VERSION,
        }
    }

    // == Is Expired ==
    /// An envelope stays valid up to and including its expiry instant.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at
    }

    /// Remaining lifetime in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self, now_ms: i64) -> i64 {
        (self.expires_at - now_ms).max(0)
    }

    /// Age of the entry in milliseconds.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        (now_ms - self.created_at).max(0)
    }
}

impl<T: Serialize> CacheEnvelope<T> {
    // == Encode ==
    /// Serializes the envelope to the store's string value type.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<T: DeserializeOwned> CacheEnvelope<T> {
    // == Decode ==
    /// Parses a stored envelope, rejecting foreign schema versions.
    pub fn decode(raw: &str) -> Result<Self> {
        let envelope: Self = serde_json::from_str(raw)?;
        if envelope.version != ENVELOPE_VERSION {
            return Err(CacheError::SchemaMismatch {
                found: envelope.version,
                expected: ENVELOPE_VERSION,
            });
        }
        Ok(envelope)
    }
}

/// Wraps and serializes `data` in one step.
pub fn encode<T: Serialize + ?Sized>(data: &T, now_ms: i64, ttl: Duration) -> Result<String> {
    CacheEnvelope::new(data, now_ms, ttl).encode()
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
