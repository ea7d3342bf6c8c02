//! Service configuration

pub mod logging;

pub use logging::{LogFormat, LoggingConfig};

use crate::admission::AdmissionPolicy;
use crate::error::{ZiweiError, ZiweiResult};
use crate::generation::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for the interpretation service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub admission: AdmissionPolicy,
    pub retry: RetryPolicy,
    pub cache: CacheSettings,
    pub models: ModelChainConfig,
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> ZiweiResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ZiweiError::config(format!("failed to read config file: {e}")))?;
        toml::from_str(&raw)
            .map_err(|e| ZiweiError::config(format!("failed to parse config file: {e}")))
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> ZiweiResult<()> {
        if self.models.preferred.trim().is_empty() {
            return Err(ZiweiError::config("a preferred model must be configured"));
        }
        if self.admission.max_requests == 0 {
            return Err(ZiweiError::config(
                "admission max_requests must be at least 1",
            ));
        }
        if self.cache.memory_capacity == 0 {
            return Err(ZiweiError::config(
                "cache memory_capacity must be at least 1",
            ));
        }
        self.logging.validate()?;
        Ok(())
    }
}

/// Cache tier sizing and sweep cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Memory tier capacity in entries
    pub memory_capacity: usize,
    /// TTL for memory tier entries
    #[serde(with = "humantime_serde")]
    pub memory_ttl: Duration,
    /// Interval between background maintenance sweeps
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            memory_capacity: 500,
            memory_ttl: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// Preferred model plus the static fallback list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelChainConfig {
    pub preferred: String,
    pub fallbacks: Vec<String>,
}

impl Default for ModelChainConfig {
    fn default() -> Self {
        Self {
            preferred: "glm-4-plus".to_string(),
            fallbacks: vec!["glm-4-air".to_string(), "qwen-plus".to_string()],
        }
    }
}
