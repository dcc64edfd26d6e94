use axum::{Json, extract::State, response::Response};

use crate::access::{AccessLevel, Caller};
use crate::common::AppState;
use crate::error::AppResult;
use crate::query::{self, BillingSummary, BuildingResponse, DashboardSummary};
use crate::routes::cache;

/// Reporting totals across the sensor log
#[utoipa::path(
    get,
    path = "/api/summary",
    responses(
        (status = 200, description = "Dashboard totals", body = DashboardSummary),
        (status = 403, description = "No role"),
    ),
    tag = "dashboard"
)]
pub async fn summary(State(state): State<AppState>, caller: Caller) -> AppResult<Response> {
    caller.access_level().require(AccessLevel::Read, "summary")?;

    if let Some(cached) = cache::get_cached(&state, cache::SUMMARY_KEY).await {
        return cache::json_response((*cached).clone(), true);
    }

    let summary = query::dashboard_summary(&state.db).await?;
    cache::cache_and_respond(&state, cache::SUMMARY_KEY, &summary).await
}

/// All buildings, for map display
#[utoipa::path(
    get,
    path = "/api/buildings",
    responses(
        (status = 200, description = "Buildings ordered by id", body = Vec<BuildingResponse>),
        (status = 403, description = "Manager role required"),
    ),
    tag = "dashboard"
)]
pub async fn list_buildings(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<Vec<BuildingResponse>>> {
    caller
        .access_level()
        .require(AccessLevel::ReadWrite, "list_buildings")?;

    let buildings = query::list_buildings(&state.db).await?;
    Ok(Json(buildings.into_iter().map(Into::into).collect()))
}

/// Number of registered sensor nodes
#[utoipa::path(
    get,
    path = "/api/billing",
    responses(
        (status = 200, description = "Billable sensor count", body = BillingSummary),
        (status = 403, description = "Superuser role required"),
    ),
    tag = "dashboard"
)]
pub async fn billing(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<BillingSummary>> {
    caller.access_level().require(AccessLevel::Admin, "billing")?;

    let sensor_nodes = query::count_sensor_nodes(&state.db).await?;
    Ok(Json(BillingSummary { sensor_nodes }))
}
