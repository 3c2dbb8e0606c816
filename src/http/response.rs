//! Response mapping.
//!
//! # Design Decisions
//! - Error bodies are fixed strings; upstream causes never cross the boundary
//! - The DTO mirrors the public JSON contract, not the domain type

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::domain::ProductDetail;
use crate::pipeline::PipelineError;

/// Public JSON shape of one similar product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDto {
    pub id: String,
    pub name: String,
    pub price: Option<f64>,
    pub availability: bool,
}

impl From<ProductDetail> for ProductDto {
    fn from(detail: ProductDetail) -> Self {
        Self {
            id: detail.id.into(),
            name: detail.name,
            price: detail.price,
            availability: detail.availability,
        }
    }
}

/// Caller-visible failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    InvalidProductId,
    ProductNotFound,
    Unavailable,
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidProductId => StatusCode::BAD_REQUEST,
            ApiError::ProductNotFound => StatusCode::NOT_FOUND,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ApiError::InvalidProductId => "Invalid productId",
            ApiError::ProductNotFound => "Product not found",
            ApiError::Unavailable => "Similar product service temporarily unavailable",
            ApiError::Internal => "Internal error",
        }
    }
}

impl From<&PipelineError> for ApiError {
    fn from(err: &PipelineError) -> Self {
        match err {
            e if e.is_circuit_open() => ApiError::Unavailable,
            PipelineError::RootNotFound { .. } => ApiError::ProductNotFound,
            PipelineError::UpstreamUnavailable { .. }
            | PipelineError::AggregationFailed(_)
            | PipelineError::Cancelled => ApiError::Internal,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.message()).into_response()
    }
}
