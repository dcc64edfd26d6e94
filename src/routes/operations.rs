use std::collections::HashMap;

use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use crate::access::Caller;
use crate::common::AppState;
use crate::error::AppResult;
use crate::operations::{OperationOutcome, OperationRequest};
use crate::routes::cache;

impl IntoResponse for OperationOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Ack => StatusCode::OK.into_response(),
            Self::Timestamp(time) => Json(json!({ "time": time })).into_response(),
            Self::Clusters(clusters) => Json(clusters).into_response(),
            Self::Sensors(sensors) => Json(sensors).into_response(),
            Self::Unrecognized { operation, time } => Json(json!({
                "time": time,
                "unrecognized_operation": operation,
            }))
            .into_response(),
        }
    }
}

/// Apply one hierarchy operation
///
/// The form's `type` field selects the operation; the remaining fields are
/// its arguments. Removals answer with a timestamp, `get_cluster` and
/// `get_sensor` with a JSON array, other mutations with an empty body.
#[utoipa::path(
    post,
    path = "/api/map_request",
    request_body(
        content = HashMap<String, String>,
        content_type = "application/x-www-form-urlencoded",
        description = "`type` plus the fields of that operation",
    ),
    responses(
        (status = 200, description = "Operation applied"),
        (status = 400, description = "Missing or invalid field"),
        (status = 403, description = "Caller may not perform this operation"),
        (status = 404, description = "Lookup key did not resolve"),
        (status = 409, description = "Natural key or reference violated"),
    ),
    tag = "hierarchy"
)]
pub async fn map_request(
    State(state): State<AppState>,
    caller: Caller,
    Form(form): Form<HashMap<String, String>>,
) -> AppResult<OperationOutcome> {
    let request = OperationRequest::from_form(form)?;
    tracing::debug!(operation = %request.kind, role = ?caller.0, "map_request");

    let outcome = state
        .dispatcher
        .dispatch(caller.access_level(), &request)
        .await?;

    if outcome.is_write() {
        cache::invalidate_all(&state);
    }
    Ok(outcome)
}

/// Liveness acknowledgment for the operation endpoint
#[utoipa::path(
    get,
    path = "/api/map_request",
    responses(
        (status = 200, description = "Current server time"),
    ),
    tag = "hierarchy"
)]
pub async fn map_request_ack() -> Json<serde_json::Value> {
    Json(json!({ "time": Utc::now() }))
}
