//! Cache facade routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tracing::debug;

use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam};
use crate::state::AppState;

use super::types::{CacheEntryResponse, CacheSetRequest};
use super::validate;

/// POST /cache
async fn set_entry(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CacheSetRequest>,
) -> Result<(StatusCode, Json<CacheEntryResponse>), ApiError> {
    validate::cache_key(&request.key)?;

    state.kv.set(&request.key, &request.value).await?;

    metrics::counter!("gatehouse_cache_ops_total", "op" => "set").increment(1);
    debug!("Cache set {} via {}", request.key, state.kv.backend_name());

    Ok((
        StatusCode::CREATED,
        Json(CacheEntryResponse {
            key: request.key,
            value: Some(request.value),
        }),
    ))
}

/// GET /cache/{key}
async fn get_entry(
    State(state): State<AppState>,
    PathParam(key): PathParam<String>,
) -> Result<Json<CacheEntryResponse>, ApiError> {
    validate::cache_key(&key)?;

    let value = state.kv.get(&key).await?;

    metrics::counter!("gatehouse_cache_ops_total", "op" => "get").increment(1);

    Ok(Json(CacheEntryResponse { key, value }))
}

/// Create cache routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cache", post(set_entry))
        .route("/cache/{key}", get(get_entry))
}
