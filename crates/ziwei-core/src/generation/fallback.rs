//! Model fallback chain
//!
//! Tries an ordered list of backend models, exercising the retry executor on
//! each. A rate limit or outage on the preferred model degrades quality
//! gracefully instead of failing the whole request.

use super::error::GenerationError;
use super::generator::NarrativeGenerator;
use super::retry::{RetryExecutor, RetryPolicy};
use crate::error::{ZiweiError, ZiweiResult};
use std::sync::Arc;
use tracing::{info, warn};

/// Order-preserving chain: the preferred model first, then each fallback not
/// already present. No duplicates.
pub fn build_model_chain(preferred: &str, fallbacks: &[String]) -> Vec<String> {
    let mut chain = Vec::with_capacity(fallbacks.len() + 1);
    chain.push(preferred.to_string());
    for model in fallbacks {
        if !chain.iter().any(|present| present == model) {
            chain.push(model.clone());
        }
    }
    chain
}

/// Runs generation across a model chain with per-model retries
pub struct ModelFallback {
    generator: Arc<dyn NarrativeGenerator>,
    retry: RetryExecutor,
    fallbacks: Vec<String>,
}

impl ModelFallback {
    pub fn new(
        generator: Arc<dyn NarrativeGenerator>,
        policy: RetryPolicy,
        fallbacks: Vec<String>,
    ) -> Self {
        Self {
            generator,
            retry: RetryExecutor::new(policy),
            fallbacks,
        }
    }

    /// Generate text, advancing down the chain on failure.
    ///
    /// The first success short-circuits; remaining models are never called.
    /// Every failure, rate limits included, advances the chain rather than
    /// aborting it. Exhaustion surfaces the last underlying error.
    pub async fn generate(&self, prompt: &str, preferred_model: &str) -> ZiweiResult<String> {
        let chain = build_model_chain(preferred_model, &self.fallbacks);
        let tried = chain.len();
        let mut last_error: Option<GenerationError> = None;

        for (position, model) in chain.iter().enumerate() {
            let attempt = self
                .retry
                .run(|| self.generator.generate(prompt, model))
                .await;

            match attempt {
                Ok(text) => {
                    if position > 0 {
                        info!(model = %model, "fell back to alternate model");
                    }
                    return Ok(text);
                }
                Err(error) => {
                    if error.is_rate_limit() {
                        warn!(model = %model, error = %error, "model rate limited, advancing chain");
                    } else {
                        warn!(model = %model, error = %error, "model failed, advancing chain");
                    }
                    last_error = Some(error);
                }
            }
        }

        let last = last_error
            .unwrap_or_else(|| GenerationError::Network("model chain was empty".to_string()));
        Err(ZiweiError::AllModelsExhausted { tried, last })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    struct ScriptedGenerator {
        /// models that succeed; everything else fails with the given error
        healthy: Vec<String>,
        failure: GenerationError,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(healthy: &[&str], failure: GenerationError) -> Self {
            Self {
                healthy: healthy.iter().map(|m| m.to_string()).collect(),
                failure,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl NarrativeGenerator for ScriptedGenerator {
        async fn generate(&self, _prompt: &str, model: &str) -> Result<String, GenerationError> {
            self.calls.lock().push(model.to_string());
            if self.healthy.iter().any(|healthy| healthy == model) {
                Ok(format!("reading from {model}"))
            } else {
                Err(self.failure.clone())
            }
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_retries(max_retries)
            .with_initial_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5))
    }

    #[test]
    fn test_chain_dedup_preserves_order() {
        let chain = build_model_chain(
            "glm-4-plus",
            &[
                "glm-4-air".to_string(),
                "glm-4-plus".to_string(),
                "qwen-plus".to_string(),
                "glm-4-air".to_string(),
            ],
        );
        assert_eq!(chain, vec!["glm-4-plus", "glm-4-air", "qwen-plus"]);
    }

    #[tokio::test]
    async fn test_preferred_success_short_circuits() {
        let generator = Arc::new(ScriptedGenerator::new(
            &["glm-4-plus"],
            GenerationError::from_status(500, "unused", None),
        ));
        let fallback = ModelFallback::new(
            generator.clone(),
            fast_policy(2),
            vec!["glm-4-air".to_string()],
        );

        let text = fallback.generate("prompt", "glm-4-plus").await.unwrap();
        assert_eq!(text, "reading from glm-4-plus");
        assert_eq!(generator.calls(), vec!["glm-4-plus"]);
    }

    #[tokio::test]
    async fn test_falls_through_to_healthy_model() {
        let generator = Arc::new(ScriptedGenerator::new(
            &["qwen-plus"],
            GenerationError::from_status(429, "limited", None),
        ));
        let fallback = ModelFallback::new(
            generator.clone(),
            fast_policy(1),
            vec!["glm-4-air".to_string(), "qwen-plus".to_string()],
        );

        let text = fallback.generate("prompt", "glm-4-plus").await.unwrap();
        assert_eq!(text, "reading from qwen-plus");

        // two retried models (2 attempts each), then one success
        let calls = generator.calls();
        assert_eq!(
            calls,
            vec!["glm-4-plus", "glm-4-plus", "glm-4-air", "glm-4-air", "qwen-plus"]
        );
    }

    #[tokio::test]
    async fn test_exhaustion_never_calls_unlisted_models() {
        let generator = Arc::new(ScriptedGenerator::new(
            &[],
            GenerationError::from_status(503, "down", None),
        ));
        let fallback = ModelFallback::new(
            generator.clone(),
            fast_policy(1),
            vec!["glm-4-air".to_string()],
        );

        let error = fallback.generate("prompt", "glm-4-plus").await.unwrap_err();
        match error {
            ZiweiError::AllModelsExhausted { tried, last } => {
                assert_eq!(tried, 2);
                assert!(matches!(last, GenerationError::Server { status: 503, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }

        let calls = generator.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|m| m == "glm-4-plus" || m == "glm-4-air"));
    }

    #[tokio::test]
    async fn test_fatal_error_still_advances_chain() {
        let generator = Arc::new(ScriptedGenerator::new(
            &[],
            GenerationError::from_status(400, "bad request", None),
        ));
        let fallback = ModelFallback::new(
            generator.clone(),
            fast_policy(3),
            vec!["glm-4-air".to_string()],
        );

        let error = fallback.generate("prompt", "glm-4-plus").await.unwrap_err();
        assert!(matches!(error, ZiweiError::AllModelsExhausted { .. }));

        // fatal errors skip retries but each model is still tried once
        assert_eq!(generator.calls(), vec!["glm-4-plus", "glm-4-air"]);
    }
}
