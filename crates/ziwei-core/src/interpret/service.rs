//! Interpretation request orchestration
//!
//! The public entry point the application layer calls. One request flows
//! admission check -> tiered cache -> model-fallback generation, and the
//! response carries cache provenance and remaining-quota metadata so callers
//! can observe how the core is behaving.

use crate::admission::{AdmissionController, AdmissionPolicy};
use crate::cache::{CacheSource, TieredCache, build_key};
use crate::chart::{ChartEngine, ChartSnapshot, InterpretScope, TransitDate, TransitOverlay};
use crate::config::ServiceConfig;
use crate::error::{ZiweiError, ZiweiResult};
use crate::generation::{ModelFallback, NarrativeGenerator};
use crate::interpret::prompt;
use crate::store::InterpretationStore;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

/// Cache key namespace for interpretations
const INTERPRET_NAMESPACE: &str = "interpret";

/// One interpretation request
#[derive(Debug, Clone)]
pub struct InterpretRequest {
    /// Chart identifier, the cache subject
    pub subject_id: String,
    pub chart: ChartSnapshot,
    pub scope: InterpretScope,
    pub date: TransitDate,
    /// Resolved client identity (see [`crate::admission::identity`])
    pub client_identity: String,
}

/// A finished interpretation with its provenance and quota metadata
#[derive(Debug, Clone, Serialize)]
pub struct Interpretation {
    pub text: String,
    pub cache_source: CacheSource,
    pub rate_limit_remaining: u32,
    pub rate_limit_reset_at: DateTime<Utc>,
}

/// The interpretation service.
///
/// Explicitly constructed and dependency-injected; create one per process
/// and share it behind an `Arc`. Background maintenance is opt-in via
/// [`start_maintenance`](Interpreter::start_maintenance).
pub struct Interpreter {
    admission: Arc<AdmissionController>,
    cache: Arc<TieredCache>,
    fallback: ModelFallback,
    chart_engine: Option<Arc<dyn ChartEngine>>,
    preferred_model: String,
    sweep_interval: Duration,
    maintenance: Mutex<Option<JoinHandle<()>>>,
}

impl Interpreter {
    /// Start building an interpreter
    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    /// Handle one interpretation request end to end.
    ///
    /// Fails fast on invalid input (400-style) and admission rejection
    /// (429-style with a retry hint). Persistent store trouble never fails
    /// the request; generator trouble surfaces only after retries and the
    /// full model chain are exhausted.
    #[instrument(skip(self, request), fields(subject = %request.subject_id, scope = %request.scope))]
    pub async fn interpret(&self, request: InterpretRequest) -> ZiweiResult<Interpretation> {
        if request.subject_id.trim().is_empty() {
            return Err(ZiweiError::invalid_input("subject id must not be empty"));
        }
        request.chart.validate()?;
        request.date.validate_for(request.scope)?;

        let decision = self.admission.check(&request.client_identity);
        if !decision.allowed {
            return Err(ZiweiError::AdmissionRejected {
                retry_after_secs: decision.retry_after_secs.unwrap_or(1),
                reset_at: decision.reset_at,
            });
        }

        let key = build_key(
            INTERPRET_NAMESPACE,
            &request.subject_id,
            &[json!({
                "scope": request.scope.as_str(),
                "year": request.date.year,
                "month": request.date.month,
                "day": request.date.day,
            })],
        );

        let outcome = self
            .cache
            .get_or_compute(
                &key,
                &request.subject_id,
                request.scope,
                &request.date,
                || async {
                    let overlay = self.transit_overlay(&request)?;
                    let prompt_text = prompt::build_prompt(
                        &request.chart,
                        request.scope,
                        &request.date,
                        overlay.as_ref(),
                    );
                    self.fallback
                        .generate(&prompt_text, &self.preferred_model)
                        .await
                },
            )
            .await?;

        debug!(source = %outcome.source, "interpretation resolved");

        Ok(Interpretation {
            text: outcome.value,
            cache_source: outcome.source,
            rate_limit_remaining: decision.remaining,
            rate_limit_reset_at: decision.reset_at,
        })
    }

    /// Transit scopes recompute their overlay from the snapshot; a natal
    /// reading, or a deployment without a chart engine, proceeds on the
    /// natal chart alone.
    fn transit_overlay(&self, request: &InterpretRequest) -> ZiweiResult<Option<TransitOverlay>> {
        if request.scope == InterpretScope::Natal {
            return Ok(None);
        }
        match &self.chart_engine {
            Some(engine) => engine
                .compute_transit(&request.chart, request.scope, &request.date)
                .map(Some),
            None => Ok(None),
        }
    }

    /// Spawn the background sweep that purges expired cache entries and
    /// elapsed admission windows. Idempotent; a second call is a no-op while
    /// a sweeper is running.
    pub fn start_maintenance(&self) {
        let mut slot = self.maintenance.lock();
        if slot.is_some() {
            return;
        }
        let admission = Arc::clone(&self.admission);
        let cache = Arc::clone(&self.cache);
        let sweep_interval = self.sweep_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            loop {
                ticker.tick().await;
                let expired = cache.memory().cleanup();
                let pruned = admission.prune();
                if expired > 0 || pruned > 0 {
                    debug!(expired, pruned, "maintenance sweep");
                }
            }
        });
        *slot = Some(handle);
    }

    /// Stop the background sweep, if one is running
    pub fn stop_maintenance(&self) {
        if let Some(handle) = self.maintenance.lock().take() {
            handle.abort();
        }
    }

    /// The admission controller, for operator introspection
    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    /// The tiered cache, for invalidation and introspection
    pub fn cache(&self) -> &TieredCache {
        &self.cache
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        self.stop_maintenance();
    }
}

/// Builder for [`Interpreter`]
pub struct InterpreterBuilder {
    config: ServiceConfig,
    generator: Option<Arc<dyn NarrativeGenerator>>,
    store: Option<Arc<dyn InterpretationStore>>,
    chart_engine: Option<Arc<dyn ChartEngine>>,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
            generator: None,
            store: None,
            chart_engine: None,
        }
    }

    /// Use the given service configuration
    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the admission policy alone
    pub fn with_admission_policy(mut self, policy: AdmissionPolicy) -> Self {
        self.config.admission = policy;
        self
    }

    /// Set the narrative generation backend (required)
    pub fn with_generator(mut self, generator: Arc<dyn NarrativeGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the persistent interpretation store (optional; without one the
    /// service runs memory-only)
    pub fn with_store(mut self, store: Arc<dyn InterpretationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the chart engine used for transit recomputation (optional)
    pub fn with_chart_engine(mut self, engine: Arc<dyn ChartEngine>) -> Self {
        self.chart_engine = Some(engine);
        self
    }

    /// Build the interpreter
    pub fn build(self) -> ZiweiResult<Interpreter> {
        self.config.validate()?;
        let generator = self
            .generator
            .ok_or_else(|| ZiweiError::config("a narrative generator is required"))?;

        let config = self.config;
        Ok(Interpreter {
            admission: Arc::new(AdmissionController::new(config.admission)),
            cache: Arc::new(TieredCache::new(
                config.cache.memory_capacity,
                config.cache.memory_ttl,
                self.store,
            )),
            fallback: ModelFallback::new(generator, config.retry, config.models.fallbacks),
            chart_engine: self.chart_engine,
            preferred_model: config.models.preferred,
            sweep_interval: config.cache.sweep_interval,
            maintenance: Mutex::new(None),
        })
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
