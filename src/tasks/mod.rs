//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the cache is in use.
//!
//! # Tasks
//! - Expiry sweep: removes expired envelopes that are never read again

mod sweep;

pub use sweep::spawn_sweep_task;
