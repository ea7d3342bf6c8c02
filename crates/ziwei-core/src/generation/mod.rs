//! Narrative generation with retry and model fallback
//!
//! The expensive, rate-limited edge of the system. Everything here operates
//! on classified errors: the HTTP layer classifies once, the retry executor
//! decides per attempt, and the fallback chain decides per model.

pub mod error;
pub mod fallback;
pub mod generator;
pub mod http;
pub mod retry;

pub use error::GenerationError;
pub use fallback::{ModelFallback, build_model_chain};
pub use generator::NarrativeGenerator;
pub use http::HttpNarrativeGenerator;
pub use retry::{AttemptOutcome, RetryExecutor, RetryPolicy};
