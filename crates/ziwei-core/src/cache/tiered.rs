//! Tiered interpretation cache
//!
//! Memory first, persistent store second, compute last, strictly in that
//! order. Lower-tier hits back-fill the memory tier; computed values
//! back-fill both. Persistent store failures degrade the system to
//! memory-only caching and are never surfaced to the caller.

use super::memory::TtlCache;
use crate::chart::{InterpretScope, TransitDate};
use crate::error::ZiweiResult;
use crate::store::InterpretationStore;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Which tier satisfied a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
    Memory,
    Persistent,
    Computed,
}

impl CacheSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Persistent => "persistent",
            Self::Computed => "computed",
        }
    }
}

impl std::fmt::Display for CacheSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value together with its cache provenance
#[derive(Debug, Clone)]
pub struct CacheOutcome {
    pub value: String,
    pub source: CacheSource,
}

/// Two-tier cache over interpretations
pub struct TieredCache {
    memory: TtlCache<String>,
    store: Option<Arc<dyn InterpretationStore>>,
    memory_ttl: Duration,
}

impl TieredCache {
    pub fn new(
        memory_capacity: usize,
        memory_ttl: Duration,
        store: Option<Arc<dyn InterpretationStore>>,
    ) -> Self {
        Self {
            memory: TtlCache::new(memory_capacity, Some(memory_ttl)),
            store,
            memory_ttl,
        }
    }

    /// Resolve `key` through the tiers, invoking `compute` only on a full
    /// miss. The computed value is written to memory synchronously and to
    /// the persistent store fire-and-forget.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        subject_id: &str,
        scope: InterpretScope,
        date: &TransitDate,
        compute: F,
    ) -> ZiweiResult<CacheOutcome>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ZiweiResult<String>>,
    {
        if let Some(value) = self.memory.get(key) {
            return Ok(CacheOutcome {
                value,
                source: CacheSource::Memory,
            });
        }

        if let Some(store) = &self.store {
            match store.get(subject_id, scope, date).await {
                Ok(Some(value)) => {
                    self.memory.set(key, value.clone(), Some(self.memory_ttl));
                    return Ok(CacheOutcome {
                        value,
                        source: CacheSource::Persistent,
                    });
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(error = %error, "persistent store read failed, treating as miss");
                }
            }
        }

        let value = compute().await?;
        self.memory.set(key, value.clone(), Some(self.memory_ttl));

        if let Some(store) = &self.store {
            let store = Arc::clone(store);
            let subject = subject_id.to_string();
            let date = *date;
            let text = value.clone();
            tokio::spawn(async move {
                if let Err(error) = store.put(&subject, scope, &date, &text).await {
                    warn!(error = %error, "persistent store write failed");
                }
            });
        }

        Ok(CacheOutcome {
            value,
            source: CacheSource::Computed,
        })
    }

    /// Drop a key from the memory tier, returning whether it was present
    pub fn invalidate(&self, key: &str) -> bool {
        self.memory.delete(key)
    }

    /// The memory tier, for sweeps and introspection
    pub fn memory(&self) -> &TtlCache<String> {
        &self.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ZiweiError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct MapStore {
        entries: Mutex<HashMap<String, String>>,
        gets: AtomicU32,
        puts: AtomicU32,
        fail_reads: bool,
    }

    impl MapStore {
        fn entry_key(subject_id: &str, scope: InterpretScope, date: &TransitDate) -> String {
            format!("{subject_id}:{scope}:{date:?}")
        }

        fn seed(&self, subject_id: &str, scope: InterpretScope, date: &TransitDate, text: &str) {
            self.entries
                .lock()
                .insert(Self::entry_key(subject_id, scope, date), text.to_string());
        }
    }

    #[async_trait]
    impl InterpretationStore for MapStore {
        async fn get(
            &self,
            subject_id: &str,
            scope: InterpretScope,
            date: &TransitDate,
        ) -> ZiweiResult<Option<String>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads {
                return Err(ZiweiError::storage("store offline"));
            }
            Ok(self
                .entries
                .lock()
                .get(&Self::entry_key(subject_id, scope, date))
                .cloned())
        }

        async fn put(
            &self,
            subject_id: &str,
            scope: InterpretScope,
            date: &TransitDate,
            text: &str,
        ) -> ZiweiResult<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.seed(subject_id, scope, date, text);
            Ok(())
        }
    }

    fn natal() -> TransitDate {
        TransitDate::default()
    }

    #[tokio::test]
    async fn test_computed_then_memory() {
        let store = Arc::new(MapStore::default());
        let cache = TieredCache::new(16, Duration::from_secs(60), Some(store.clone()));

        let first = cache
            .get_or_compute("k", "chart1", InterpretScope::Natal, &natal(), || async {
                Ok("fresh".to_string())
            })
            .await
            .unwrap();
        assert_eq!(first.source, CacheSource::Computed);

        let second = cache
            .get_or_compute("k", "chart1", InterpretScope::Natal, &natal(), || async {
                panic!("must not recompute on a memory hit")
            })
            .await
            .unwrap();
        assert_eq!(second.source, CacheSource::Memory);
        assert_eq!(second.value, "fresh");
    }

    #[tokio::test]
    async fn test_persistent_hit_backfills_memory() {
        let store = Arc::new(MapStore::default());
        store.seed("chart1", InterpretScope::Natal, &natal(), "durable");
        let cache = TieredCache::new(16, Duration::from_secs(60), Some(store.clone()));

        let first = cache
            .get_or_compute("k", "chart1", InterpretScope::Natal, &natal(), || async {
                panic!("must not compute on a persistent hit")
            })
            .await
            .unwrap();
        assert_eq!(first.source, CacheSource::Persistent);
        assert_eq!(first.value, "durable");
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);

        // the second request is served from memory without touching the store
        let second = cache
            .get_or_compute("k", "chart1", InterpretScope::Natal, &natal(), || async {
                panic!("must not compute")
            })
            .await
            .unwrap();
        assert_eq!(second.source, CacheSource::Memory);
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_computed_value_reaches_persistent_store() {
        let store = Arc::new(MapStore::default());
        let cache = TieredCache::new(16, Duration::from_secs(60), Some(store.clone()));

        cache
            .get_or_compute("k", "chart1", InterpretScope::Natal, &natal(), || async {
                Ok("fresh".to_string())
            })
            .await
            .unwrap();

        // the write is fire-and-forget; give the spawned task a beat
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.puts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_store_read_failure_degrades_to_compute() {
        let store = Arc::new(MapStore {
            fail_reads: true,
            ..Default::default()
        });
        let cache = TieredCache::new(16, Duration::from_secs(60), Some(store));

        let outcome = cache
            .get_or_compute("k", "chart1", InterpretScope::Natal, &natal(), || async {
                Ok("computed anyway".to_string())
            })
            .await
            .unwrap();
        assert_eq!(outcome.source, CacheSource::Computed);
        assert_eq!(outcome.value, "computed anyway");
    }

    #[tokio::test]
    async fn test_memory_only_when_no_store_configured() {
        let cache = TieredCache::new(16, Duration::from_secs(60), None);

        let outcome = cache
            .get_or_compute("k", "chart1", InterpretScope::Natal, &natal(), || async {
                Ok("fresh".to_string())
            })
            .await
            .unwrap();
        assert_eq!(outcome.source, CacheSource::Computed);
        assert!(cache.memory().has("k"));
    }

    #[tokio::test]
    async fn test_compute_failure_propagates_and_caches_nothing() {
        let cache = TieredCache::new(16, Duration::from_secs(60), None);

        let result = cache
            .get_or_compute("k", "chart1", InterpretScope::Natal, &natal(), || async {
                Err(ZiweiError::invalid_input("boom"))
            })
            .await;
        assert!(result.is_err());
        assert!(!cache.memory().has("k"));
    }

    #[test]
    fn test_cache_source_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CacheSource::Persistent).unwrap(),
            "\"persistent\""
        );
    }
}
