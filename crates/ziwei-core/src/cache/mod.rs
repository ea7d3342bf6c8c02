//! Caching for interpretation requests
//!
//! Two tiers sit in front of the narrative backend:
//!
//! - **Memory**: a bounded LRU cache with per-entry TTL, for repeat requests
//!   within a session.
//! - **Persistent**: the durable interpretation store, so a redeploy or cache
//!   sweep does not force a regeneration.
//!
//! Keys are deterministic across processes (see [`build_key`]), which is what
//! makes the persistent tier addressable at all.

pub mod key;
pub mod memory;
pub mod tiered;

pub use key::build_key;
pub use memory::{CacheEntry, CacheStats, TtlCache};
pub use tiered::{CacheOutcome, CacheSource, TieredCache};
