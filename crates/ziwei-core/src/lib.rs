//! Ziwei interpretation core
//!
//! This crate is the resilient orchestration layer between the horoscope
//! application and a costly, rate-limited text-generation backend:
//! per-client admission control, deterministic tiered caching, retry with
//! backoff honoring server hints, and graceful multi-model fallback.

pub mod admission;
pub mod cache;
pub mod chart;
pub mod config;
pub mod error;
pub mod generation;
pub mod interpret;
pub mod store;

// Re-export commonly used types
pub use admission::{AdmissionController, AdmissionDecision, AdmissionPolicy};
pub use cache::{CacheOutcome, CacheSource, TieredCache, TtlCache, build_key};
pub use chart::{
    BirthInfo, BirthParams, ChartEngine, ChartSnapshot, InterpretScope, Palace, Star, TransitDate,
    TransitOverlay,
};
pub use config::{LogFormat, LoggingConfig, ServiceConfig};
pub use error::{ZiweiError, ZiweiResult};
pub use generation::{
    GenerationError, HttpNarrativeGenerator, ModelFallback, NarrativeGenerator, RetryExecutor,
    RetryPolicy,
};
pub use interpret::{Interpretation, Interpreter, InterpreterBuilder, InterpretRequest};
pub use store::{DiskStore, InterpretationStore};
