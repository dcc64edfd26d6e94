use axum::{
    Form, Json,
    extract::{Query, State},
    response::Response,
};

use crate::access::{AccessLevel, Caller};
use crate::common::AppState;
use crate::error::AppResult;
use crate::query::{self, LogFilter, LogFilterForm, LogIndexes, SensorLogEntry};
use crate::routes::cache;

async fn run_filter(
    state: &AppState,
    caller: Caller,
    form: LogFilterForm,
) -> AppResult<Json<Vec<SensorLogEntry>>> {
    caller
        .access_level()
        .require(AccessLevel::Read, "data_request")?;
    let filter = LogFilter::try_from(form)?;
    Ok(Json(query::filter_log(&state.db, &filter).await?))
}

/// Filter the sensor log (form body)
///
/// Date bounds are exclusive: records dated exactly `start_date` or
/// `end_date` are not returned.
#[utoipa::path(
    post,
    path = "/api/data_request",
    request_body(content = LogFilterForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Matching log records", body = Vec<SensorLogEntry>),
        (status = 400, description = "Unparseable filter value"),
    ),
    tag = "data"
)]
pub async fn data_request(
    State(state): State<AppState>,
    caller: Caller,
    Form(form): Form<LogFilterForm>,
) -> AppResult<Json<Vec<SensorLogEntry>>> {
    run_filter(&state, caller, form).await
}

/// Filter the sensor log (query string)
///
/// Date bounds are exclusive: records dated exactly `start_date` or
/// `end_date` are not returned.
#[utoipa::path(
    get,
    path = "/api/data_request",
    params(LogFilterForm),
    responses(
        (status = 200, description = "Matching log records", body = Vec<SensorLogEntry>),
        (status = 400, description = "Unparseable filter value"),
    ),
    tag = "data"
)]
pub async fn data_request_query(
    State(state): State<AppState>,
    caller: Caller,
    Query(form): Query<LogFilterForm>,
) -> AppResult<Json<Vec<SensorLogEntry>>> {
    run_filter(&state, caller, form).await
}

/// Distinct buildings, floors and rooms in the sensor log
#[utoipa::path(
    get,
    path = "/api/data/indexes",
    responses(
        (status = 200, description = "Filter picker values", body = LogIndexes),
    ),
    tag = "data"
)]
pub async fn log_indexes(State(state): State<AppState>, caller: Caller) -> AppResult<Response> {
    caller
        .access_level()
        .require(AccessLevel::Read, "log_indexes")?;

    if let Some(cached) = cache::get_cached(&state, cache::LOG_INDEXES_KEY).await {
        return cache::json_response((*cached).clone(), true);
    }

    let indexes = query::log_indexes(&state.db).await?;
    cache::cache_and_respond(&state, cache::LOG_INDEXES_KEY, &indexes).await
}
