//! Cache-aside, breaker-guarded similar-products resolution.

use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::cache::ResultCache;
use crate::config::{RootNotFoundPolicy, ServiceConfig};
use crate::domain::{AggregatedResult, ProductDetail, ProductId};
use crate::observability::metrics;
use crate::pipeline::error::{PipelineError, Reason, Stage};
use crate::resilience::{BreakerFailure, BreakerRegistry, CallClass};
use crate::upstream::{UpstreamCallError, UpstreamClient};

/// Cache of aggregated results keyed by root product id.
pub type SimilarCache = dyn ResultCache<ProductId, AggregatedResult>;

/// Optional cache of individual product details.
pub type DetailsCache = dyn ResultCache<ProductId, ProductDetail>;

/// Tunables the pipeline reads on every request.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_concurrent_fetches: usize,
    pub root_not_found: RootNotFoundPolicy,
    pub result_ttl: Duration,
    pub details_ttl: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            max_concurrent_fetches: config.pipeline.max_concurrent_fetches,
            root_not_found: config.pipeline.root_not_found,
            result_ttl: config.cache.ttl(),
            details_ttl: config.cache.details_ttl(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&ServiceConfig::default())
    }
}

/// Resolves the similar products of a root product.
///
/// Holds no per-request state; every collaborator is shared and injected.
#[derive(Clone)]
pub struct AggregationPipeline {
    client: Arc<dyn UpstreamClient>,
    breakers: BreakerRegistry,
    cache: Arc<SimilarCache>,
    details_cache: Option<Arc<DetailsCache>>,
    settings: PipelineSettings,
}

impl AggregationPipeline {
    pub fn new(
        client: Arc<dyn UpstreamClient>,
        breakers: BreakerRegistry,
        cache: Arc<SimilarCache>,
        details_cache: Option<Arc<DetailsCache>>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            client,
            breakers,
            cache,
            details_cache,
            settings,
        }
    }

    pub fn breakers(&self) -> &BreakerRegistry {
        &self.breakers
    }

    pub fn cache(&self) -> &Arc<SimilarCache> {
        &self.cache
    }

    pub fn details_cache(&self) -> Option<&Arc<DetailsCache>> {
        self.details_cache.as_ref()
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Resolve without an external cancellation signal.
    pub async fn resolve_similar(&self, id: &ProductId) -> Result<AggregatedResult, PipelineError> {
        self.resolve_similar_with_cancel(id, &CancellationToken::new())
            .await
    }

    /// Resolve, abandoning the work as soon as `cancel` fires.
    ///
    /// A cancelled resolution issues no further detail lookups and leaves the
    /// cache untouched.
    pub async fn resolve_similar_with_cancel(
        &self,
        id: &ProductId,
        cancel: &CancellationToken,
    ) -> Result<AggregatedResult, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        if let Some(hit) = self.cache.get(id).await {
            tracing::debug!(product_id = %id, entries = hit.len(), "Served similar products from cache");
            return Ok(hit);
        }

        let similar_ids = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            result = self.fetch_similar_ids(id) => result?,
        };

        let details = if similar_ids.is_empty() {
            Vec::new()
        } else {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(product_id = %id, "Resolution cancelled during detail fan-out");
                    return Err(PipelineError::Cancelled);
                }
                details = self.fetch_details(&similar_ids) => details,
            }
        };

        self.cache
            .put(id.clone(), details.clone(), self.settings.result_ttl)
            .await
            .map_err(|e| PipelineError::AggregationFailed(e.to_string()))?;

        tracing::debug!(
            product_id = %id,
            requested = similar_ids.len(),
            resolved = details.len(),
            "Resolved similar products"
        );
        Ok(details)
    }

    /// Stage one. Any failure here is fatal to the request.
    async fn fetch_similar_ids(&self, id: &ProductId) -> Result<Vec<ProductId>, PipelineError> {
        let class = CallClass::SimilarIds;
        let breaker = self.breakers.get(class);
        let outcome = breaker
            .run(|| self.client.similar_ids(id), self.failure_classifier())
            .await;

        match outcome {
            Ok(ids) => {
                metrics::record_upstream_call(class.as_str(), "success");
                Ok(ids.unwrap_or_default())
            }
            Err(BreakerFailure::CallNotPermitted) => {
                metrics::record_upstream_call(class.as_str(), "rejected");
                tracing::warn!(product_id = %id, class = %class, "Circuit open, similar-ids call not permitted");
                Err(PipelineError::UpstreamUnavailable {
                    stage: Stage::SimilarIds,
                    reason: Reason::CircuitOpen,
                    cause: None,
                })
            }
            Err(BreakerFailure::Call(e)) if e.is_not_found() => {
                metrics::record_upstream_call(class.as_str(), "not-found");
                match self.settings.root_not_found {
                    RootNotFoundPolicy::Empty => {
                        tracing::debug!(product_id = %id, "Root product unknown upstream, treating as no similar products");
                        Ok(Vec::new())
                    }
                    RootNotFoundPolicy::NotFound => Err(PipelineError::RootNotFound {
                        product_id: id.clone(),
                    }),
                }
            }
            Err(BreakerFailure::Call(e)) => {
                metrics::record_upstream_call(class.as_str(), "error");
                tracing::warn!(product_id = %id, class = %class, error = %e, "Similar-ids call failed");
                Err(PipelineError::UpstreamUnavailable {
                    stage: Stage::SimilarIds,
                    reason: Reason::CallError,
                    cause: Some(e),
                })
            }
        }
    }

    /// Stage two. Order follows `ids`; failed or empty lookups are dropped.
    async fn fetch_details(&self, ids: &[ProductId]) -> AggregatedResult {
        let concurrency = self.settings.max_concurrent_fetches.max(1);
        let lookups: Vec<_> = ids.iter().map(|id| self.fetch_detail(id)).collect();
        let fetched: Vec<Option<ProductDetail>> = stream::iter(lookups)
            .buffered(concurrency)
            .collect()
            .await;

        fetched.into_iter().flatten().collect()
    }

    async fn fetch_detail(&self, id: &ProductId) -> Option<ProductDetail> {
        if let Some(cache) = &self.details_cache {
            if let Some(detail) = cache.get(id).await {
                return Some(detail);
            }
        }

        let class = CallClass::ProductById;
        let breaker = self.breakers.get(class);
        let outcome = breaker
            .run(|| self.client.details_by_id(id), self.failure_classifier())
            .await;

        match outcome {
            Ok(Some(detail)) => {
                metrics::record_upstream_call(class.as_str(), "success");
                if let Some(cache) = &self.details_cache {
                    if let Err(e) = cache
                        .put(id.clone(), detail.clone(), self.settings.details_ttl)
                        .await
                    {
                        tracing::warn!(product_id = %id, error = %e, "Failed to cache product detail");
                    }
                }
                Some(detail)
            }
            Ok(None) => {
                metrics::record_upstream_call(class.as_str(), "success");
                tracing::debug!(product_id = %id, "Product detail body empty, dropping entry");
                None
            }
            Err(BreakerFailure::CallNotPermitted) => {
                metrics::record_upstream_call(class.as_str(), "rejected");
                tracing::warn!(product_id = %id, class = %class, "Circuit open, dropping product detail");
                None
            }
            Err(BreakerFailure::Call(e)) => {
                let outcome = if e.is_not_found() { "not-found" } else { "error" };
                metrics::record_upstream_call(class.as_str(), outcome);
                tracing::warn!(product_id = %id, class = %class, error = %e, "Product detail lookup failed, dropping entry");
                None
            }
        }
    }

    /// Which call errors count against a breaker.
    fn failure_classifier(&self) -> impl Fn(&UpstreamCallError) -> bool {
        let not_found_is_failure = self.breakers.config().record_not_found_as_failure;
        move |e: &UpstreamCallError| not_found_is_failure || !e.is_not_found()
    }
}
