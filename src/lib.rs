//! Similar-products aggregation service library.

// Core subsystems
pub mod config;
pub mod domain;
pub mod http;
pub mod pipeline;
pub mod upstream;

// Shared state
pub mod cache;
pub mod resilience;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::{Application, Shutdown};
pub use pipeline::{AggregationPipeline, PipelineError};
