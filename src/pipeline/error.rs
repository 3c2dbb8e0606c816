//! Pipeline error taxonomy.

use std::fmt;
use thiserror::Error;

use crate::domain::ProductId;
use crate::upstream::UpstreamCallError;

/// Upstream call stage a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SimilarIds,
    ProductById,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::SimilarIds => "similar-ids",
            Stage::ProductById => "product-by-id",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an upstream stage was unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The breaker rejected the call without reaching upstream.
    CircuitOpen,
    /// The call was made and failed.
    CallError,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::CircuitOpen => "circuit-open",
            Reason::CallError => "call-error",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-facing outcomes of a failed resolution.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("upstream unavailable at stage {stage} ({reason})")]
    UpstreamUnavailable {
        stage: Stage,
        reason: Reason,
        cause: Option<UpstreamCallError>,
    },

    /// Only raised under the `not-found` root policy.
    #[error("product {product_id} not found")]
    RootNotFound { product_id: ProductId },

    /// Internal defect, e.g. the cache refused a write.
    #[error("aggregation failed: {0}")]
    AggregationFailed(String),

    #[error("request cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn is_circuit_open(&self) -> bool {
        matches!(
            self,
            PipelineError::UpstreamUnavailable {
                reason: Reason::CircuitOpen,
                ..
            }
        )
    }
}
