//! Disk-backed interpretation store
//!
//! One JSON file per interpretation under a per-scope directory. Stands in
//! for the managed database in self-hosted deployments and tests. A file
//! that fails to parse is treated as absent and removed.

use super::InterpretationStore;
use crate::cache::build_key;
use crate::chart::{InterpretScope, TransitDate};
use crate::error::{ZiweiError, ZiweiResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize)]
struct StoredInterpretation {
    text: String,
    written_at: DateTime<Utc>,
}

/// File-per-entry store rooted at a base directory
#[derive(Debug)]
pub struct DiskStore {
    base_dir: PathBuf,
}

impl DiskStore {
    /// Create a store rooted at `base_dir`, creating the directory if needed
    pub fn new(base_dir: impl AsRef<Path>) -> ZiweiResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        if !base_dir.exists() {
            std::fs::create_dir_all(&base_dir).map_err(|e| {
                ZiweiError::storage(format!("failed to create store directory: {e}"))
            })?;
        }
        Ok(Self { base_dir })
    }

    fn file_path(&self, subject_id: &str, scope: InterpretScope, date: &TransitDate) -> PathBuf {
        let key = build_key(
            scope.as_str(),
            subject_id,
            &[json!({
                "year": date.year,
                "month": date.month,
                "day": date.day,
            })],
        );
        let filename = format!("{}.json", sanitize_filename(&key));
        self.base_dir.join(scope.as_str()).join(filename)
    }
}

#[async_trait]
impl InterpretationStore for DiskStore {
    async fn get(
        &self,
        subject_id: &str,
        scope: InterpretScope,
        date: &TransitDate,
    ) -> ZiweiResult<Option<String>> {
        let path = self.file_path(subject_id, scope, date);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ZiweiError::storage(format!("failed to read entry: {e}"))),
        };

        match serde_json::from_str::<StoredInterpretation>(&content) {
            Ok(stored) => Ok(Some(stored.text)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "removing corrupted store entry");
                let _ = fs::remove_file(&path).await;
                Ok(None)
            }
        }
    }

    async fn put(
        &self,
        subject_id: &str,
        scope: InterpretScope,
        date: &TransitDate,
        text: &str,
    ) -> ZiweiResult<()> {
        let path = self.file_path(subject_id, scope, date);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ZiweiError::storage(format!("failed to create scope dir: {e}")))?;
        }

        let stored = StoredInterpretation {
            text: text.to_string(),
            written_at: Utc::now(),
        };
        let content = serde_json::to_string(&stored)
            .map_err(|e| ZiweiError::storage(format!("failed to serialize entry: {e}")))?;

        fs::write(&path, content)
            .await
            .map_err(|e| ZiweiError::storage(format!("failed to write entry: {e}")))
    }
}

fn sanitize_filename(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}
