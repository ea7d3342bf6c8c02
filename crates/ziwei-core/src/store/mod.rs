//! Persistent interpretation storage
//!
//! The durable tier behind the in-process cache. Reads and writes are
//! best-effort: the tiered coordinator logs failures and carries on, so an
//! unavailable store degrades the system to memory-only caching instead of
//! failing requests.

pub mod disk;

pub use disk::DiskStore;

use crate::chart::{InterpretScope, TransitDate};
use crate::error::ZiweiResult;
use async_trait::async_trait;

/// Key-addressable store for finished interpretations
#[async_trait]
pub trait InterpretationStore: Send + Sync {
    /// Fetch a previously stored interpretation, if one exists
    async fn get(
        &self,
        subject_id: &str,
        scope: InterpretScope,
        date: &TransitDate,
    ) -> ZiweiResult<Option<String>>;

    /// Store an interpretation. Eventual consistency is acceptable.
    async fn put(
        &self,
        subject_id: &str,
        scope: InterpretScope,
        date: &TransitDate,
        text: &str,
    ) -> ZiweiResult<()>;
}
