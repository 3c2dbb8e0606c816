//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → sections handed to each subsystem at startup
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, resolve_config, ConfigError, ENV_CONFIG_PATH};
pub use schema::{
    AdminConfig, CacheConfig, CircuitBreakerConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, PipelineConfig, RootNotFoundPolicy, ServiceConfig, TimeoutConfig,
    UpstreamConfig,
};
