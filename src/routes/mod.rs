pub mod cache;
pub mod dashboard;
pub mod data;
pub mod health;
pub mod operations;
mod rate_limit;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};

use rate_limit::ClientIpKeyExtractor;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::query;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        operations::map_request,
        operations::map_request_ack,
        data::data_request,
        data::data_request_query,
        data::log_indexes,
        dashboard::summary,
        dashboard::list_buildings,
        dashboard::billing,
    ),
    components(
        schemas(
            query::BuildingResponse,
            query::ClusterResponse,
            query::SensorResponse,
            query::SensorLogEntry,
            query::LogIndexes,
            query::LogFilterForm,
            query::DashboardSummary,
            query::BillingSummary,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "hierarchy", description = "Buildings, clusters and sensors"),
        (name = "data", description = "Sensor log queries"),
        (name = "dashboard", description = "Aggregates and listings"),
    ),
    info(
        title = "GreenBuilding API",
        description = "Building, cluster and sensor hierarchy with a sensor log query engine",
        version = "0.1.0"
    )
)]
struct ApiDoc;

/// Build the application router.
///
/// # Errors
///
/// Returns `AppError::Internal` if the rate limiter rejects its settings
/// (a zero rate or burst).
pub fn build_router(state: AppState) -> AppResult<Router> {
    let config = &state.config;

    let api_routes_base = Router::new()
        .route(
            "/map_request",
            get(operations::map_request_ack).post(operations::map_request),
        )
        .route(
            "/data_request",
            get(data::data_request_query).post(data::data_request),
        )
        .route("/data/indexes", get(data::log_indexes))
        .route("/summary", get(dashboard::summary))
        .route("/buildings", get(dashboard::list_buildings))
        .route("/billing", get(dashboard::billing));

    let api_routes = if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
        api_routes_base
    } else {
        tracing::info!(
            per_second = config.rate_limit_per_second,
            burst = config.rate_limit_burst,
            "Rate limiting configured"
        );

        let limiter = GovernorConfigBuilder::default()
            .key_extractor(ClientIpKeyExtractor)
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .finish()
            .ok_or_else(|| AppError::Internal("Invalid rate limiter settings".to_string()))?;

        api_routes_base.layer(GovernorLayer {
            config: Arc::new(limiter),
        })
    }
    .layer(RequestBodyLimitLayer::new(64 * 1024)); // 64KB body limit

    // Health check routes (NO rate limiting)
    let health_routes = Router::new().route("/healthz", get(health::healthz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Ok(Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
