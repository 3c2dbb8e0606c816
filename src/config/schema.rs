//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the similar-products service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream catalog service connection settings.
    pub upstream: UpstreamConfig,

    /// Circuit breaker tuning, shared by every call class.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Result cache settings.
    pub cache: CacheConfig,

    /// Aggregation pipeline behavior.
    pub pipeline: PipelineConfig,

    /// Inbound request timeouts.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Upstream catalog client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the catalog service (e.g., "http://localhost:3001").
    pub base_url: String,

    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Read timeout (whole request/response) in milliseconds.
    pub read_timeout_ms: u64,

    /// Maximum idle pooled connections kept per upstream host.
    pub pool_max_idle_per_host: usize,

    /// Idle pooled connections are evicted after this many seconds.
    pub pool_idle_timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            connect_timeout_ms: 5000,
            read_timeout_ms: 5000,
            pool_max_idle_per_host: 50,
            pool_idle_timeout_secs: 15,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Number of most recent call outcomes considered (sliding window).
    pub sliding_window_size: usize,

    /// Minimum recorded calls before the failure rate is evaluated.
    pub minimum_calls: usize,

    /// Failure rate (percent, 1-100) at which the breaker opens.
    pub failure_rate_threshold: u8,

    /// How long the breaker stays open before allowing probes, in milliseconds.
    pub open_cooldown_ms: u64,

    /// Probe calls permitted while half-open.
    pub half_open_max_calls: usize,

    /// Whether upstream "not found" answers count as breaker failures.
    pub record_not_found_as_failure: bool,
}

impl CircuitBreakerConfig {
    pub fn open_cooldown(&self) -> Duration {
        Duration::from_millis(self.open_cooldown_ms)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            sliding_window_size: 10,
            minimum_calls: 5,
            failure_rate_threshold: 50,
            open_cooldown_ms: 10_000,
            half_open_max_calls: 3,
            record_not_found_as_failure: false,
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live of an aggregated similar-products entry, in seconds.
    pub ttl_secs: u64,

    /// Upper bound on aggregated entries held in memory.
    pub max_entries: usize,

    /// Keep a secondary cache of individual product details.
    pub details_enabled: bool,

    /// Time-to-live of a cached product detail, in seconds.
    pub details_ttl_secs: u64,

    /// Upper bound on cached product details.
    pub details_max_entries: usize,

    /// Interval between expired-entry sweeps, in seconds.
    pub sweep_interval_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn details_ttl(&self) -> Duration {
        Duration::from_secs(self.details_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            max_entries: 10_000,
            details_enabled: false,
            details_ttl_secs: 7200,
            details_max_entries: 50_000,
            sweep_interval_secs: 60,
        }
    }
}

/// What the pipeline does when the root product is unknown upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RootNotFoundPolicy {
    /// Treat it as "no similar products": an empty, cached result.
    #[default]
    Empty,
    /// Surface a dedicated not-found error (HTTP 404); nothing is cached.
    NotFound,
}

/// Aggregation pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Detail lookups in flight at once per request (1 = sequential).
    pub max_concurrent_fetches: usize,

    /// Root product not-found handling.
    pub root_not_found: RootNotFoundPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 4,
            root_not_found: RootNotFoundPolicy::Empty,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let config = ServiceConfig::default();
        assert_eq!(config.cache.ttl(), Duration::from_secs(3600));
        assert_eq!(config.upstream.read_timeout(), Duration::from_secs(5));
        assert_eq!(config.pipeline.root_not_found, RootNotFoundPolicy::Empty);
        assert!(!config.cache.details_enabled);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [upstream]
            base_url = "http://catalog:3001"

            [pipeline]
            root_not_found = "not-found"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.base_url, "http://catalog:3001");
        assert_eq!(config.upstream.connect_timeout_ms, 5000);
        assert_eq!(config.pipeline.root_not_found, RootNotFoundPolicy::NotFound);
        assert_eq!(config.pipeline.max_concurrent_fetches, 4);
    }
}
