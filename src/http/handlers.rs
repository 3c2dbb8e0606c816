//! Public route handlers.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::ProductId;
use crate::http::request::request_id;
use crate::http::response::{ApiError, ProductDto};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::pipeline::PipelineError;
use crate::resilience::{BreakerSnapshot, CircuitState};

/// `GET /product/{productId}/similar`
pub async fn get_similar_products(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&headers);

    let response = match resolve(&state, &raw_id, &request_id).await {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(err) => err.into_response(),
    };

    metrics::record_request(response.status().as_u16(), start_time);
    response
}

async fn resolve(state: &AppState, raw_id: &str, request_id: &str) -> Result<Vec<ProductDto>, ApiError> {
    let product_id = ProductId::parse_numeric(raw_id).map_err(|e| {
        tracing::debug!(request_id = %request_id, raw_id = %raw_id, error = %e, "Rejected productId");
        ApiError::InvalidProductId
    })?;

    // Dropping the handler future (client gone, timeout) cancels the pipeline.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let products = state
        .pipeline
        .resolve_similar_with_cancel(&product_id, &cancel)
        .await
        .map_err(|e| {
            log_failure(request_id, &product_id, &e);
            ApiError::from(&e)
        })?;

    Ok(products.into_iter().map(ProductDto::from).collect())
}

fn log_failure(request_id: &str, product_id: &ProductId, err: &PipelineError) {
    match err {
        PipelineError::UpstreamUnavailable { stage, reason, cause } => tracing::warn!(
            request_id = %request_id,
            product_id = %product_id,
            stage = %stage,
            reason = %reason,
            cause = ?cause,
            "Similar products unavailable"
        ),
        PipelineError::RootNotFound { .. } => tracing::info!(
            request_id = %request_id,
            product_id = %product_id,
            "Root product not found"
        ),
        PipelineError::AggregationFailed(detail) => tracing::error!(
            request_id = %request_id,
            product_id = %product_id,
            error = %detail,
            "Aggregation failed"
        ),
        PipelineError::Cancelled => tracing::debug!(
            request_id = %request_id,
            product_id = %product_id,
            "Request cancelled"
        ),
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub breakers: Vec<BreakerSnapshot>,
}

/// `GET /health`. Always 200; reports `degraded` while any breaker is open.
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let breakers = state.pipeline.breakers().snapshot();
    let degraded = breakers.iter().any(|b| b.state == CircuitState::Open);

    Json(HealthStatus {
        status: if degraded { "degraded" } else { "up" },
        breakers,
    })
}
