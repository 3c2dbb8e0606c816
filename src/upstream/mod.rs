//! Upstream catalog subsystem.
//!
//! # Data Flow
//! ```text
//! AggregationPipeline
//!     → client.rs (UpstreamClient port, typed call errors)
//!     → http.rs (reqwest adapter, pooled connections, timeouts)
//!     → catalog service: /product/{id}/similarids, /product/{id}
//! ```
//!
//! # Design Decisions
//! - Timeouts belong to the transport; callers add no deadline of their own
//! - "Not found" is a distinct error so callers can pick a policy per stage

pub mod client;
pub mod http;

pub use client::{UpstreamCallError, UpstreamClient, UpstreamResult};
pub use http::HttpUpstreamClient;
