//! HTTP surface: form dispatch, role gating and response caching.
//!
//! Run with: cargo test --test routes_test

mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use common::{FixedGeocoder, Reading, WAYCREST, insert_reading, setup_db};
use greenbuilding::common::AppState;
use greenbuilding::config::{Config, Deployment};
use greenbuilding::operations::RemovalPolicy;
use greenbuilding::routes;

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        geocoder_base_url: "http://127.0.0.1:9".to_string(),
        geocoder_user_agent: "greenbuilding-tests".to_string(),
        geocoder_timeout_seconds: 1,
        removal_policy: RemovalPolicy::default(),
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        disable_rate_limiting: true,
        rate_limit_per_second: 5,
        rate_limit_burst: 60,
        cache_ttl_seconds: 60,
        cache_max_bytes: 1024 * 1024,
        deployment: Deployment::Local,
        log_json: false,
    }
}

async fn app() -> (Router, sea_orm::DatabaseConnection) {
    let db = setup_db().await;
    let state = AppState::new(
        db.clone(),
        test_config(),
        Arc::new(FixedGeocoder(Some(WAYCREST))),
    );
    (routes::build_router(state).expect("router"), db)
}

fn post_form(uri: &str, role: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(role) = role {
        builder = builder.header("x-user-role", role);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, role: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(role) = role {
        builder = builder.header("x-user-role", role);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

const ADD_HQ: &str = concat!(
    "type=add_building&building_name=HQ",
    "&address=1500+Joseph+Street&city=San+Jose&state=CA&zip=95126",
);

#[tokio::test]
async fn healthz_needs_no_role() {
    let (app, _db) = app().await;

    let response = app.oneshot(get("/healthz", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn map_request_get_returns_time() {
    let (app, _db) = app().await;

    let response = app.oneshot(get("/api/map_request", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["time"].is_string());
}

#[tokio::test]
async fn mutation_without_role_is_forbidden() {
    let (app, _db) = app().await;

    let response = app
        .oneshot(post_form("/api/map_request", None, ADD_HQ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["kind"], "forbidden");
}

#[tokio::test]
async fn manager_builds_and_reads_hierarchy_over_http() {
    let (app, _db) = app().await;

    let response = app
        .clone()
        .oneshot(post_form("/api/map_request", Some("manager"), ADD_HQ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_form(
            "/api/map_request",
            Some("manager"),
            "type=add_cluster&building_id=1&floor=2&ip=10.0.0.1",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_form(
            "/api/map_request",
            Some("user"),
            "type=get_cluster&building_id=1",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let clusters = body_json(response).await;
    assert_eq!(clusters.as_array().unwrap().len(), 1);
    assert_eq!(clusters[0]["ip"], "10.0.0.1");
    assert_eq!(clusters[0]["floor"], 2);

    let response = app
        .oneshot(post_form(
            "/api/map_request",
            Some("manager"),
            "type=remove_building&building_id=1",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["time"].is_string());
}

#[tokio::test]
async fn integrity_errors_map_to_status_codes() {
    let (app, _db) = app().await;

    let response = app
        .clone()
        .oneshot(post_form(
            "/api/map_request",
            Some("manager"),
            "type=add_cluster&building_id=9&floor=1&ip=10.0.0.1",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["kind"], "foreign_key_violation");

    let response = app
        .clone()
        .oneshot(post_form(
            "/api/map_request",
            Some("manager"),
            "type=add_cluster&building_id=9&floor=1",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["kind"], "missing_field");

    let response = app
        .oneshot(post_form("/api/map_request", Some("manager"), "building_id=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_operation_is_echoed_back() {
    let (app, _db) = app().await;

    let response = app
        .oneshot(post_form("/api/map_request", None, "type=teleport_building"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["unrecognized_operation"], "teleport_building");
    assert!(body["time"].is_string());
}

#[tokio::test]
async fn data_request_filters_by_form_and_query() {
    let (app, db) = app().await;
    for (date, time) in [
        ("2020-01-01", "08:00"),
        ("2020-01-15", "08:05"),
        ("2020-02-01", "08:00"),
    ] {
        insert_reading(
            &db,
            Reading {
                date,
                time,
                ..Default::default()
            },
        )
        .await;
    }

    let response = app
        .clone()
        .oneshot(post_form(
            "/api/data_request",
            Some("user"),
            "building=1&floor=&room=&start_date=2020-01-01&end_date=2020-02-01",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let entries = body_json(response).await;
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["date"], "2020-01-15");
    assert_eq!(entries[0]["time"], "08:05");

    let response = app
        .clone()
        .oneshot(get("/api/data_request?building=2", Some("user")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await.as_array().unwrap().is_empty());

    let response = app
        .oneshot(get("/api/data_request?start_date=yesterday", Some("user")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn indexes_are_cached_until_a_mutation_commits() {
    let (app, db) = app().await;
    insert_reading(
        &db,
        Reading {
            room: "101",
            ..Default::default()
        },
    )
    .await;

    let first = app
        .clone()
        .oneshot(get("/api/data/indexes", Some("user")))
        .await
        .unwrap();
    assert_eq!(first.headers()["x-cache"], "MISS");
    assert_eq!(body_json(first).await["rooms"], serde_json::json!(["101"]));

    let second = app
        .clone()
        .oneshot(get("/api/data/indexes", Some("user")))
        .await
        .unwrap();
    assert_eq!(second.headers()["x-cache"], "HIT");

    let response = app
        .clone()
        .oneshot(post_form("/api/map_request", Some("manager"), ADD_HQ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let third = app
        .oneshot(get("/api/data/indexes", Some("user")))
        .await
        .unwrap();
    assert_eq!(third.headers()["x-cache"], "MISS");
}

#[tokio::test]
async fn dashboard_endpoints_are_role_gated() {
    let (app, _db) = app().await;

    let response = app.clone().oneshot(get("/api/summary", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(get("/api/summary", Some("user")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/api/buildings", Some("user")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(get("/api/buildings", Some("manager")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/api/billing", Some("manager")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(get("/api/billing", Some("superuser")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["sensor_nodes"], 0);
}
