//! Priority-ordered provider routing with circuit-gated fallback

use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use vigil_config::LlmConfig;

use crate::error::RouteError;
use crate::health::HealthRegistry;
use crate::provider::{ProviderAdapter, build_adapter};
use crate::types::{Attempt, AttemptClass, CompletionRequest, RouteOutcome};

/// Walks the candidate list until a provider serves the request
///
/// Candidate order is the request's explicit provider (when named)
/// followed by the configured priority list. Each candidate is gated by
/// the circuit breaker; skips and failures accumulate in the attempt
/// trail so the caller can see exactly why fallback happened.
pub struct ProviderRouter {
    adapters: IndexMap<String, Arc<dyn ProviderAdapter>>,
    priority: Vec<String>,
    health: Arc<HealthRegistry>,
}

impl ProviderRouter {
    /// Build adapters and breaker state for every configured provider
    pub fn from_config(config: &LlmConfig) -> Self {
        let adapters: IndexMap<String, Arc<dyn ProviderAdapter>> = config
            .providers
            .iter()
            .map(|(name, provider_config)| (name.clone(), build_adapter(name, provider_config)))
            .collect();

        // Priority list first, then any configured provider it omits
        let mut priority: Vec<String> = config
            .priority
            .iter()
            .filter(|name| adapters.contains_key(*name))
            .cloned()
            .collect();
        for name in adapters.keys() {
            if !priority.contains(name) {
                priority.push(name.clone());
            }
        }

        let health = Arc::new(HealthRegistry::new(
            &config.circuit_breaker,
            adapters.keys().cloned(),
        ));

        Self {
            adapters,
            priority,
            health,
        }
    }

    /// Breaker state, shared with the status endpoint
    pub fn health(&self) -> &Arc<HealthRegistry> {
        &self.health
    }

    /// Whether a provider name is configured
    #[must_use]
    pub fn knows_provider(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    /// Provider and model the request would reach first
    ///
    /// Used for the pre-flight cost estimate; ignores breaker state so
    /// the estimate is stable regardless of provider health.
    #[must_use]
    pub fn primary_target(&self, request: &CompletionRequest) -> Option<(String, String)> {
        let provider = request
            .provider
            .clone()
            .or_else(|| self.priority.first().cloned())?;
        let adapter = self.adapters.get(&provider)?;
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| adapter.default_model().to_owned());
        Some((provider, model))
    }

    /// Candidate order for a request
    fn candidates(&self, request: &CompletionRequest) -> Vec<String> {
        let mut order = Vec::with_capacity(self.priority.len() + 1);
        if let Some(explicit) = &request.provider
            && self.adapters.contains_key(explicit)
        {
            order.push(explicit.clone());
        }
        for name in &self.priority {
            if !order.contains(name) {
                order.push(name.clone());
            }
        }
        order
    }

    /// Route a completion request through the candidate list
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::AllProvidersUnavailable`] with the full
    /// attempt trail when no candidate produces a completion.
    pub async fn route(&self, request: &CompletionRequest) -> Result<RouteOutcome, RouteError> {
        let started = Instant::now();
        let mut attempts: Vec<Attempt> = Vec::new();

        for (index, provider_name) in self.candidates(request).into_iter().enumerate() {
            if !self.health.try_acquire(&provider_name) {
                tracing::debug!(provider = %provider_name, "skipping provider, circuit breaker open");
                attempts.push(Attempt {
                    provider: provider_name,
                    classification: AttemptClass::CircuitOpen,
                    detail: "circuit breaker open".to_owned(),
                });
                continue;
            }

            // candidates() only yields configured names
            let Some(adapter) = self.adapters.get(&provider_name) else {
                continue;
            };

            // The requested model binds only to the first candidate;
            // fallback providers serve their own default
            let model = if index == 0 {
                request
                    .model
                    .clone()
                    .unwrap_or_else(|| adapter.default_model().to_owned())
            } else {
                adapter.default_model().to_owned()
            };

            match adapter
                .complete(&request.messages, &model, request.max_tokens, request.temperature)
                .await
            {
                Ok(response) => {
                    self.health.record_outcome(&provider_name, true);
                    if !attempts.is_empty() {
                        tracing::info!(
                            provider = %provider_name,
                            failed_attempts = attempts.len(),
                            "fallback provider served request"
                        );
                    }
                    let fallback_reason = attempts
                        .first()
                        .map(|a| format!("{}: {}", a.provider, a.detail));
                    return Ok(RouteOutcome {
                        provider_used: provider_name,
                        model_used: response.model_used,
                        content: response.content,
                        usage: response.usage,
                        fallback_triggered: !attempts.is_empty(),
                        fallback_reason,
                        attempts,
                        latency: started.elapsed(),
                    });
                }
                Err(error) => {
                    self.health.record_outcome(&provider_name, false);
                    tracing::warn!(
                        provider = %provider_name,
                        model = %model,
                        error = %error,
                        "provider attempt failed, trying next candidate"
                    );
                    attempts.push(Attempt {
                        provider: provider_name,
                        classification: error.class().into(),
                        detail: error.to_string(),
                    });
                }
            }
        }

        Err(RouteError::AllProvidersUnavailable { attempts })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use vigil_config::CircuitBreakerConfig;

    use super::*;
    use crate::error::AdapterError;
    use crate::types::{AdapterResponse, Message, Usage};

    /// Scripted adapter: fails the first `fail_first` calls, then succeeds
    struct ScriptedAdapter {
        name: String,
        fail_first: u32,
        permanent: bool,
        calls: AtomicU32,
    }

    impl ScriptedAdapter {
        fn new(name: &str, fail_first: u32) -> Self {
            Self {
                name: name.to_owned(),
                fail_first,
                permanent: false,
                calls: AtomicU32::new(0),
            }
        }

        fn permanent(name: &str) -> Self {
            Self {
                name: name.to_owned(),
                fail_first: u32::MAX,
                permanent: true,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ProviderAdapter for ScriptedAdapter {
        fn name(&self) -> &str {
            &self.name
        }

        fn default_model(&self) -> &str {
            "scripted-default"
        }

        async fn complete(
            &self,
            _messages: &[Message],
            model: &str,
            _max_tokens: u32,
            _temperature: f64,
        ) -> Result<AdapterResponse, AdapterError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                if self.permanent {
                    return Err(AdapterError::Status {
                        status: 401,
                        detail: "invalid key".to_owned(),
                    });
                }
                return Err(AdapterError::Status {
                    status: 503,
                    detail: "overloaded".to_owned(),
                });
            }
            Ok(AdapterResponse {
                content: format!("from {}", self.name),
                model_used: model.to_owned(),
                usage: Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                },
            })
        }
    }

    fn router_with(adapters: Vec<Arc<ScriptedAdapter>>) -> (ProviderRouter, Vec<Arc<ScriptedAdapter>>) {
        let priority: Vec<String> = adapters.iter().map(|a| a.name.clone()).collect();
        let map: IndexMap<String, Arc<dyn ProviderAdapter>> = adapters
            .iter()
            .map(|a| (a.name.clone(), Arc::clone(a) as Arc<dyn ProviderAdapter>))
            .collect();
        let health = Arc::new(HealthRegistry::new(
            &CircuitBreakerConfig::default(),
            map.keys().cloned(),
        ));
        (
            ProviderRouter {
                adapters: map,
                priority,
                health,
            },
            adapters,
        )
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![Message {
                role: crate::types::Role::User,
                content: "hello".to_owned(),
            }],
            provider: None,
            model: None,
            max_tokens: 64,
            temperature: 0.7,
        }
    }

    #[tokio::test]
    async fn first_healthy_provider_serves_without_fallback() {
        let (router, _) = router_with(vec![
            Arc::new(ScriptedAdapter::new("a", 0)),
            Arc::new(ScriptedAdapter::new("b", 0)),
        ]);

        let outcome = router.route(&request()).await.unwrap();
        assert_eq!(outcome.provider_used, "a");
        assert!(!outcome.fallback_triggered);
        assert!(outcome.attempts.is_empty());
        assert!(outcome.fallback_reason.is_none());
    }

    #[tokio::test]
    async fn failure_falls_back_to_next_candidate() {
        let (router, adapters) = router_with(vec![
            Arc::new(ScriptedAdapter::new("a", u32::MAX)),
            Arc::new(ScriptedAdapter::new("b", 0)),
        ]);

        let outcome = router.route(&request()).await.unwrap();
        assert_eq!(outcome.provider_used, "b");
        assert!(outcome.fallback_triggered);
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.attempts[0].classification, AttemptClass::Transient);
        assert!(outcome.fallback_reason.as_deref().unwrap().starts_with("a:"));
        assert_eq!(adapters[0].calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn double_fallback_reaches_third_candidate() {
        let (router, _) = router_with(vec![
            Arc::new(ScriptedAdapter::new("a", u32::MAX)),
            Arc::new(ScriptedAdapter::new("b", u32::MAX)),
            Arc::new(ScriptedAdapter::new("c", 0)),
        ]);

        let outcome = router.route(&request()).await.unwrap();
        assert_eq!(outcome.provider_used, "c");
        assert!(outcome.fallback_triggered);
        assert_eq!(outcome.attempts.len(), 2);

        // Each failed candidate took exactly one health hit
        let snapshot = router.health().snapshot();
        for provider in ["a", "b"] {
            let snap = snapshot.iter().find(|s| s.provider_id == provider).unwrap();
            assert_eq!(snap.consecutive_failures, 1);
        }
    }

    #[tokio::test]
    async fn permanent_failures_keep_their_classification() {
        let (router, _) = router_with(vec![
            Arc::new(ScriptedAdapter::permanent("a")),
            Arc::new(ScriptedAdapter::new("b", 0)),
        ]);

        let outcome = router.route(&request()).await.unwrap();
        assert_eq!(outcome.attempts[0].classification, AttemptClass::Permanent);
    }

    #[tokio::test]
    async fn explicit_provider_is_tried_first() {
        let (router, _) = router_with(vec![
            Arc::new(ScriptedAdapter::new("a", 0)),
            Arc::new(ScriptedAdapter::new("b", 0)),
        ]);

        let mut req = request();
        req.provider = Some("b".to_owned());
        let outcome = router.route(&req).await.unwrap();
        assert_eq!(outcome.provider_used, "b");
        assert!(!outcome.fallback_triggered);
    }

    #[tokio::test]
    async fn requested_model_binds_only_to_first_candidate() {
        let (router, _) = router_with(vec![
            Arc::new(ScriptedAdapter::new("a", u32::MAX)),
            Arc::new(ScriptedAdapter::new("b", 0)),
        ]);

        let mut req = request();
        req.model = Some("pinned-model".to_owned());
        let outcome = router.route(&req).await.unwrap();
        assert_eq!(outcome.provider_used, "b");
        assert_eq!(outcome.model_used, "scripted-default");
    }

    #[tokio::test]
    async fn open_circuit_skips_without_adapter_call() {
        let (router, adapters) = router_with(vec![
            Arc::new(ScriptedAdapter::new("a", u32::MAX)),
            Arc::new(ScriptedAdapter::new("b", 0)),
        ]);

        // Trip a's breaker
        for _ in 0..3 {
            let _ = router.route(&request()).await;
        }
        let calls_before = adapters[0].calls.load(Ordering::SeqCst);

        let outcome = router.route(&request()).await.unwrap();
        assert_eq!(outcome.provider_used, "b");
        assert_eq!(outcome.attempts[0].classification, AttemptClass::CircuitOpen);
        // No further adapter invocations while the breaker is open
        assert_eq!(adapters[0].calls.load(Ordering::SeqCst), calls_before);
    }

    #[tokio::test]
    async fn exhausted_candidates_return_full_trail() {
        let (router, _) = router_with(vec![
            Arc::new(ScriptedAdapter::new("a", u32::MAX)),
            Arc::new(ScriptedAdapter::new("b", u32::MAX)),
        ]);

        let error = router.route(&request()).await.unwrap_err();
        let RouteError::AllProvidersUnavailable { attempts } = error;
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].provider, "a");
        assert_eq!(attempts[1].provider, "b");
    }

    #[test]
    fn primary_target_prefers_explicit_provider_and_model() {
        let (router, _) = router_with(vec![
            Arc::new(ScriptedAdapter::new("a", 0)),
            Arc::new(ScriptedAdapter::new("b", 0)),
        ]);

        let mut req = request();
        req.provider = Some("b".to_owned());
        req.model = Some("custom".to_owned());
        let (provider, model) = router.primary_target(&req).unwrap();
        assert_eq!(provider, "b");
        assert_eq!(model, "custom");

        let (provider, model) = router.primary_target(&request()).unwrap();
        assert_eq!(provider, "a");
        assert_eq!(model, "scripted-default");
    }
}
