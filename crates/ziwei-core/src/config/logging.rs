//! Logging configuration
//!
//! Controls how the service emits `tracing` output. The filter is validated
//! when the service is built; the subscriber itself is installed once at
//! process startup via [`LoggingConfig::init_tracing`].

use crate::error::{ZiweiError, ZiweiResult};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Output format for log events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directives, e.g. `info` or `ziwei_core=debug,warn`
    pub level: String,
    pub format: LogFormat,
    /// Append to this file instead of standard output
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Reject filter directives tracing cannot parse
    pub fn validate(&self) -> ZiweiResult<()> {
        self.env_filter().map(|_| ())
    }

    /// Install the global tracing subscriber described by this config.
    ///
    /// Call once at process startup. Fails if the filter is invalid, the log
    /// file cannot be opened, or a subscriber is already installed.
    pub fn init_tracing(&self) -> ZiweiResult<()> {
        let filter = self.env_filter()?;
        let writer = match &self.file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| ZiweiError::config(format!("failed to open log file: {e}")))?;
                BoxMakeWriter::new(Arc::new(file))
            }
            None => BoxMakeWriter::new(std::io::stdout),
        };

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer);
        let installed = match self.format {
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
        installed
            .map_err(|e| ZiweiError::config(format!("failed to install tracing subscriber: {e}")))
    }

    fn env_filter(&self) -> ZiweiResult<EnvFilter> {
        EnvFilter::try_new(&self.level)
            .map_err(|e| ZiweiError::config(format!("invalid log filter '{}': {e}", self.level)))
    }
}
