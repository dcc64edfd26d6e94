//! Response caching for the full-log read endpoints.
//!
//! Index and summary responses scan the whole sensor log, so their serialized
//! bodies are kept until the TTL expires or a hierarchy mutation commits.
//! New log records arrive through the external ingestion path; they become
//! visible here at the latest after one TTL.

use axum::{
    http::{HeaderValue, header},
    response::Response,
};
use serde::Serialize;
use std::sync::Arc;

use crate::common::AppState;
use crate::error::{AppError, AppResult};

pub const LOG_INDEXES_KEY: &str = "log_indexes";
pub const SUMMARY_KEY: &str = "summary";

pub async fn get_cached(state: &AppState, cache_key: &str) -> Option<Arc<Vec<u8>>> {
    let cached = state.response_cache.get(cache_key).await?;
    tracing::debug!(cache_key = %cache_key, "cache_hit");
    Some(cached)
}

/// Drop every cached body; called after a committed mutation.
pub fn invalidate_all(state: &AppState) {
    state.response_cache.invalidate_all();
    tracing::debug!("cache_invalidated");
}

/// Build a JSON response with X-Cache header
pub fn json_response(data: Vec<u8>, cache_hit: bool) -> AppResult<Response> {
    let cache_header = if cache_hit { "HIT" } else { "MISS" };
    Response::builder()
        .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .header("X-Cache", HeaderValue::from_static(cache_header))
        .body(axum::body::Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Serialize and cache a response, then return it
pub async fn cache_and_respond<T: Serialize>(
    state: &AppState,
    cache_key: &str,
    response: &T,
) -> AppResult<Response> {
    let json_bytes =
        serde_json::to_vec(response).map_err(|e| AppError::Internal(e.to_string()))?;

    state
        .response_cache
        .insert(cache_key.to_string(), Arc::new(json_bytes.clone()))
        .await;

    json_response(json_bytes, false)
}
