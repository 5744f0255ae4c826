//! Service router: variant-to-backend dispatch with retry policy.
//!
//! The router owns everything between "this item should be variant X" and
//! "here is the rendered content or a typed failure": adapter lookup,
//! per-service timeouts, the two retry budgets, exponential backoff, and
//! proactive pacing of consecutive calls to the same backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use deckflow_core::config::{EngineConfig, RouterConfig, ServicePolicy};
use deckflow_core::content::{ContentGenerator, ContentItemSpec, GenerationResult};
use deckflow_core::variant::{ClassificationResult, VariantDefinition, VariantRegistry};
use deckflow_core::{DeckflowError, Result};

use crate::adapter::ServiceAdapter;

/// Routes classified items to their owning service adapter.
///
/// Cheap to share behind an `Arc`; all mutable state is the per-service
/// pacing clock.
pub struct ServiceRouter {
    registry: Arc<VariantRegistry>,
    adapters: HashMap<String, Arc<dyn ServiceAdapter>>,
    config: RouterConfig,
    /// Last dispatch instant per service, for inter-call pacing.
    pacers: RwLock<HashMap<String, Arc<Mutex<Option<Instant>>>>>,
}

/// Manual impl: the adapter trait objects are not `Debug`.
impl std::fmt::Debug for ServiceRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRouter")
            .field("adapters", &self.adapters.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ServiceRouter {
    pub fn new(registry: Arc<VariantRegistry>, config: RouterConfig) -> Self {
        Self {
            registry,
            adapters: HashMap::new(),
            config,
            pacers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers an adapter under its own service name.
    pub fn with_adapter(mut self, adapter: Arc<dyn ServiceAdapter>) -> Self {
        self.adapters
            .insert(adapter.service_name().to_string(), adapter);
        self
    }

    /// Builds a router over the standard adapter fleet.
    ///
    /// Applies the config's base-url overrides and checks that the fleet
    /// covers every service the registry names, so a mismatch fails at
    /// wiring time.
    pub fn standard(registry: Arc<VariantRegistry>, config: &EngineConfig) -> Result<Self> {
        let mut router = Self::new(registry, config.router.clone());
        for adapter in crate::adapters::standard_adapters(config)? {
            router = router.with_adapter(adapter);
        }
        router.validate_coverage()?;
        Ok(router)
    }

    /// Checks that every service named by the registry has an adapter.
    ///
    /// Called once at wiring time so a catalog/adapter mismatch surfaces
    /// at startup instead of as per-item failures mid-batch.
    pub fn validate_coverage(&self) -> Result<()> {
        for service in self.registry.service_names() {
            if !self.adapters.contains_key(service) {
                return Err(DeckflowError::configuration(format!(
                    "no adapter registered for service '{}'",
                    service
                )));
            }
        }
        Ok(())
    }

    fn resolve(
        &self,
        classification: &ClassificationResult,
    ) -> Result<(&VariantDefinition, &Arc<dyn ServiceAdapter>)> {
        let variant = self.registry.get(&classification.variant_id).ok_or_else(|| {
            DeckflowError::configuration(format!(
                "variant '{}' is not in the registry",
                classification.variant_id
            ))
        })?;
        let adapter = self.adapters.get(&variant.service_name).ok_or_else(|| {
            DeckflowError::configuration(format!(
                "no adapter registered for service '{}'",
                variant.service_name
            ))
        })?;
        Ok((variant, adapter))
    }

    /// Runs the retry loop for one item against its resolved adapter.
    ///
    /// Each call is wrapped in the per-service timeout. Failures are
    /// classified through the policy: rate-limit and transient failures
    /// retry within their respective attempt budgets with doubling,
    /// capped backoff; everything else fails immediately. A backend's
    /// retry-after hint replaces the computed backoff, still capped.
    async fn dispatch(
        &self,
        item: &ContentItemSpec,
        variant: &VariantDefinition,
        adapter: &Arc<dyn ServiceAdapter>,
    ) -> GenerationResult {
        let policy = self.config.policy_for(&variant.service_name);

        let request = match adapter.build_request(item, variant) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(
                    target: "router",
                    "Item {} not dispatched: {}",
                    item.sequence_number,
                    err
                );
                return GenerationResult::failed(item.sequence_number, &err, 0);
            }
        };

        let mut attempts: u32 = 0;
        loop {
            self.pace(&variant.service_name, policy).await;
            attempts += 1;

            let outcome =
                tokio::time::timeout(policy.timeout(), adapter.execute(&variant.endpoint, &request))
                    .await;
            let error = match outcome {
                Ok(Ok(content)) => {
                    tracing::debug!(
                        target: "router",
                        "Item {} rendered by '{}' as '{}' (attempt {})",
                        item.sequence_number,
                        variant.service_name,
                        variant.variant_id,
                        attempts
                    );
                    return GenerationResult::success(item.sequence_number, content, attempts);
                }
                Ok(Err(err)) => err,
                Err(_) => DeckflowError::transient_network(
                    &variant.service_name,
                    format!("no response within {}ms", policy.timeout_ms),
                ),
            };

            let Some(budget) = policy.attempt_budget(&error) else {
                tracing::warn!(
                    target: "router",
                    "Item {} failed permanently against '{}': {}",
                    item.sequence_number,
                    variant.service_name,
                    error
                );
                return GenerationResult::failed(item.sequence_number, &error, attempts);
            };

            if attempts >= budget {
                tracing::warn!(
                    target: "router",
                    "Item {} exhausted its {} attempts against '{}': {}",
                    item.sequence_number,
                    budget,
                    variant.service_name,
                    error
                );
                return GenerationResult::failed(item.sequence_number, &error, attempts);
            }

            let delay = error
                .retry_after()
                .unwrap_or_else(|| policy.backoff_delay(attempts))
                .min(policy.max_delay());
            tracing::warn!(
                target: "router",
                "Item {} attempt {}/{} against '{}' failed ({}), retrying in {:?}",
                item.sequence_number,
                attempts,
                budget,
                variant.service_name,
                error,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Delays until at least the policy's inter-call spacing has passed
    /// since the previous dispatch to `service`, then claims the slot.
    ///
    /// The per-service mutex is held across the wait so concurrent items
    /// headed for the same backend leave spaced out; calls to other
    /// services are not affected.
    async fn pace(&self, service: &str, policy: &ServicePolicy) {
        let spacing = policy.inter_call_delay();
        if spacing.is_zero() {
            return;
        }

        let pacer = {
            let pacers = self.pacers.read().await;
            pacers.get(service).cloned()
        };
        let pacer = match pacer {
            Some(pacer) => pacer,
            None => {
                let mut pacers = self.pacers.write().await;
                pacers
                    .entry(service.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(None)))
                    .clone()
            }
        };

        let mut last = pacer.lock().await;
        if let Some(previous) = *last {
            let since = previous.elapsed();
            if since < spacing {
                tokio::time::sleep(spacing - since).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl ContentGenerator for ServiceRouter {
    async fn generate(
        &self,
        item: &ContentItemSpec,
        classification: &ClassificationResult,
    ) -> GenerationResult {
        match self.resolve(classification) {
            Ok((variant, adapter)) => self.dispatch(item, variant, adapter).await,
            Err(err) => {
                tracing::warn!(
                    target: "router",
                    "Item {} is unroutable: {}",
                    item.sequence_number,
                    err
                );
                GenerationResult::failed(item.sequence_number, &err, 0)
            }
        }
    }
}
