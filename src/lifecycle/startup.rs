//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the upstream client, breakers, caches and pipeline from config
//! - Start cache sweepers tied to the shutdown coordinator
//! - Hand the wired pipeline to the HTTP server
//!
//! # Design Decisions
//! - Collaborators are constructed here once and shared by `Arc`
//! - Tests inject their own `UpstreamClient` through `with_client`

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::cache::{run_sweeper, TtlCache};
use crate::config::ServiceConfig;
use crate::domain::{AggregatedResult, ProductDetail, ProductId};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::pipeline::{AggregationPipeline, DetailsCache, PipelineSettings};
use crate::resilience::BreakerRegistry;
use crate::upstream::{HttpUpstreamClient, UpstreamCallError, UpstreamClient};

const SWEEPER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build upstream client: {0}")]
    Upstream(#[from] UpstreamCallError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fully wired service, ready to serve.
pub struct Application {
    config: ServiceConfig,
    pipeline: AggregationPipeline,
    similar_cache: Arc<TtlCache<ProductId, AggregatedResult>>,
    details_cache: Option<Arc<TtlCache<ProductId, ProductDetail>>>,
}

impl Application {
    /// Wire the service against the configured HTTP upstream.
    pub fn build(config: ServiceConfig) -> Result<Self, StartupError> {
        let client = HttpUpstreamClient::new(&config.upstream)?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Wire the service against any upstream implementation.
    pub fn with_client(config: ServiceConfig, client: Arc<dyn UpstreamClient>) -> Self {
        let breakers = BreakerRegistry::new(config.circuit_breaker.clone());
        let similar_cache: Arc<TtlCache<ProductId, AggregatedResult>> =
            Arc::new(TtlCache::new("similar", config.cache.max_entries));
        let details_cache: Option<Arc<TtlCache<ProductId, ProductDetail>>> = config
            .cache
            .details_enabled
            .then(|| Arc::new(TtlCache::new("details", config.cache.details_max_entries)));

        let pipeline = AggregationPipeline::new(
            client,
            breakers,
            similar_cache.clone(),
            details_cache.clone().map(|cache| cache as Arc<DetailsCache>),
            PipelineSettings::from_config(&config),
        );

        tracing::info!(
            cache_ttl_secs = config.cache.ttl_secs,
            cache_max_entries = config.cache.max_entries,
            details_cache = config.cache.details_enabled,
            max_concurrent_fetches = config.pipeline.max_concurrent_fetches,
            root_not_found = ?config.pipeline.root_not_found,
            "Aggregation pipeline ready"
        );

        Self {
            config,
            pipeline,
            similar_cache,
            details_cache,
        }
    }

    pub fn pipeline(&self) -> &AggregationPipeline {
        &self.pipeline
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires, then wait for the sweepers.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), StartupError> {
        let interval = Duration::from_secs(self.config.cache.sweep_interval_secs.max(1));

        tokio::spawn(run_sweeper(
            self.similar_cache.clone(),
            interval,
            shutdown.subscribe(),
        ));
        if let Some(details) = &self.details_cache {
            tokio::spawn(run_sweeper(details.clone(), interval, shutdown.subscribe()));
        }

        let server = HttpServer::new(self.config, self.pipeline);
        server.run(listener, shutdown.subscribe()).await?;

        shutdown.drain(SWEEPER_DRAIN_TIMEOUT).await;
        Ok(())
    }
}
