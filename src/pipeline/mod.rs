//! Similar-products aggregation.
//!
//! # Data Flow
//! ```text
//! resolve_similar(id)
//!     → result cache (hit: return, no upstream traffic)
//!     → "similar-ids" breaker → UpstreamClient::similar_ids
//!     → "product-by-id" breaker → UpstreamClient::details_by_id (per id, bounded fan-out)
//!     → result cache write → caller
//! ```
//!
//! # Design Decisions
//! - A failure at the similar-ids stage aborts the request and caches nothing
//! - A failure for one detail drops that entry; the rest still resolve in order
//! - Empty results are cached like any other
//! - Cancellation stops further detail calls and skips the cache write

pub mod aggregator;
pub mod error;

pub use aggregator::{AggregationPipeline, DetailsCache, PipelineSettings, SimilarCache};
pub use error::{PipelineError, Reason, Stage};
