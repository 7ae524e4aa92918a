//! Cache Module
//!
//! Provides a TTL key-value cache over a durable string store, with lazy
//! expiry, prefix invalidation and single-flight fetch-or-populate.

mod entry;
mod fetch;
mod file_store;
pub mod keys;
mod service;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{encode, CacheEnvelope, Clock, ManualClock, SystemClock, ENVELOPE_VERSION};
pub use file_store::FileStore;
pub use service::CacheService;
pub use stats::{CacheCounters, CacheStats};
pub use store::{DurableStore, MemoryStore};
