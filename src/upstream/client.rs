//! Upstream client port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ProductDetail, ProductId};

/// Errors raised by a single upstream call.
#[derive(Debug, Clone, Error)]
pub enum UpstreamCallError {
    /// Upstream answered 404 for the resource.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Upstream answered with another non-success status.
    #[error("upstream returned {status} for {resource}")]
    Status { status: u16, resource: String },

    /// The call did not complete within the transport deadline.
    #[error("upstream timed out")]
    Timeout,

    /// Connection or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The body could not be decoded.
    #[error("invalid upstream payload: {0}")]
    Decode(String),
}

impl UpstreamCallError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, UpstreamCallError::NotFound { .. })
    }
}

/// Result type for upstream calls.
pub type UpstreamResult<T> = Result<T, UpstreamCallError>;

/// The two lookups the catalog service offers.
///
/// `Ok(None)` means the upstream answered successfully with a `null`/empty
/// body.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Similar product ids of `id`, in upstream order.
    async fn similar_ids(&self, id: &ProductId) -> UpstreamResult<Option<Vec<ProductId>>>;

    /// Details of a single product.
    async fn details_by_id(&self, id: &ProductId) -> UpstreamResult<Option<ProductDetail>>;
}
