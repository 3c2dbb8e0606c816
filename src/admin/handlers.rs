use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::domain::ProductId;
use crate::http::server::AppState;
use crate::resilience::{BreakerSnapshot, CallClass};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub upstream: String,
}

#[derive(Serialize)]
pub struct CacheSummary {
    pub name: &'static str,
    pub entries: usize,
    pub ttl_secs: u64,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        upstream: state.config.upstream.base_url.clone(),
    })
}

pub async fn get_breakers(State(state): State<AppState>) -> Json<Vec<BreakerSnapshot>> {
    Json(state.pipeline.breakers().snapshot())
}

pub async fn reset_breaker(
    State(state): State<AppState>,
    Path(class): Path<String>,
) -> Result<Json<BreakerSnapshot>, (StatusCode, String)> {
    let class: CallClass = class
        .parse()
        .map_err(|e: String| (StatusCode::NOT_FOUND, e))?;

    let breaker = state.pipeline.breakers().get(class);
    breaker.reset();
    tracing::info!(class = %class, "Breaker reset by operator");
    Ok(Json(breaker.snapshot()))
}

pub async fn get_cache(State(state): State<AppState>) -> Json<Vec<CacheSummary>> {
    let settings = state.pipeline.settings();
    let mut caches = vec![CacheSummary {
        name: "similar",
        entries: state.pipeline.cache().len(),
        ttl_secs: settings.result_ttl.as_secs(),
    }];
    if let Some(details) = state.pipeline.details_cache() {
        caches.push(CacheSummary {
            name: "details",
            entries: details.len(),
            ttl_secs: settings.details_ttl.as_secs(),
        });
    }
    Json(caches)
}

pub async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.pipeline.cache().clear().await;
    if let Some(details) = state.pipeline.details_cache() {
        details.clear().await;
    }
    tracing::info!("Caches cleared by operator");
    StatusCode::NO_CONTENT
}

pub async fn invalidate_cache_entry(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> StatusCode {
    let Ok(product_id) = ProductId::new(raw_id) else {
        return StatusCode::BAD_REQUEST;
    };

    if state.pipeline.cache().invalidate(&product_id).await {
        tracing::info!(product_id = %product_id, "Cache entry invalidated by operator");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
