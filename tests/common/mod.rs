//! Shared fixtures: an in-memory migrated database and stub geocoders.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sea_orm::{
    ActiveValue::Set, ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
};
use sea_orm_migration::MigratorTrait;

use greenbuilding::access::AccessLevel;
use greenbuilding::entity::{buildings, cluster_nodes, sensor_data, sensor_nodes};
use greenbuilding::error::{AppError, AppResult};
use greenbuilding::geocoding::{Coordinate, Geocoder};
use greenbuilding::operations::{Dispatcher, OperationOutcome, OperationRequest, RemovalPolicy};
use greenbuilding::query;

pub const WAYCREST: Coordinate = Coordinate {
    lat: 37.335_48,
    lng: -121.893_028,
};

/// Fresh SQLite database in memory with the schema applied.
///
/// A single pooled connection keeps every query on the same in-memory file.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("failed to open in-memory sqlite");
    migration::Migrator::up(&db, None)
        .await
        .expect("failed to run migrations");
    db
}

/// Always answers with the same lookup result.
pub struct FixedGeocoder(pub Option<Coordinate>);

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn geocode(&self, _address: &str) -> AppResult<Option<Coordinate>> {
        Ok(self.0)
    }
}

/// Provider that cannot be reached.
pub struct FailingGeocoder;

#[async_trait]
impl Geocoder for FailingGeocoder {
    async fn geocode(&self, _address: &str) -> AppResult<Option<Coordinate>> {
        Err(AppError::GeocodeUnavailable("connection refused".to_string()))
    }
}

/// Provider that never answers in time.
pub struct StalledGeocoder;

#[async_trait]
impl Geocoder for StalledGeocoder {
    async fn geocode(&self, _address: &str) -> AppResult<Option<Coordinate>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Some(WAYCREST))
    }
}

pub fn dispatcher(db: &DatabaseConnection) -> Dispatcher {
    dispatcher_with(db, Arc::new(FixedGeocoder(Some(WAYCREST))), RemovalPolicy::default())
}

pub fn dispatcher_with(
    db: &DatabaseConnection,
    geocoder: Arc<dyn Geocoder>,
    policy: RemovalPolicy,
) -> Dispatcher {
    Dispatcher::new(db.clone(), geocoder, policy)
}

pub fn request(kind: &str, fields: &[(&str, &str)]) -> OperationRequest {
    OperationRequest::new(kind, fields.iter().copied())
}

/// Dispatch with full rights.
pub async fn run(
    dispatcher: &Dispatcher,
    kind: &str,
    fields: &[(&str, &str)],
) -> AppResult<OperationOutcome> {
    dispatcher
        .dispatch(AccessLevel::Admin, &request(kind, fields))
        .await
}

/// Add a building and return its id.
pub async fn add_building(dispatcher: &Dispatcher, db: &DatabaseConnection, name: &str) -> i32 {
    run(
        dispatcher,
        "add_building",
        &[
            ("building_name", name),
            ("address", "1500 Joseph Street"),
            ("city", "San Jose"),
            ("state", "CA"),
            ("zip", "95126"),
        ],
    )
    .await
    .expect("add_building failed");

    query::list_buildings(db)
        .await
        .expect("list_buildings failed")
        .last()
        .expect("no building stored")
        .id
}

/// Add a cluster and return its id.
pub async fn add_cluster(
    dispatcher: &Dispatcher,
    db: &DatabaseConnection,
    building_id: i32,
    floor: i32,
    ip: &str,
) -> i32 {
    let building = building_id.to_string();
    let floor_str = floor.to_string();
    run(
        dispatcher,
        "add_cluster",
        &[("building_id", &building), ("floor", &floor_str), ("ip", ip)],
    )
    .await
    .expect("add_cluster failed");

    query::clusters_for_building(db, building_id)
        .await
        .expect("clusters_for_building failed")
        .into_iter()
        .find(|c| c.floor == floor && c.ip == ip)
        .expect("cluster not stored")
        .id
}

/// Add a sensor under the cluster at `cluster_ip` and return its id.
pub async fn add_sensor(
    dispatcher: &Dispatcher,
    db: &DatabaseConnection,
    building_id: i32,
    cluster_ip: &str,
    sensor_ip: &str,
) -> i32 {
    let building = building_id.to_string();
    run(
        dispatcher,
        "add_sensor",
        &[
            ("building_id", &building),
            ("cluster_ip", cluster_ip),
            ("sensor_ip", sensor_ip),
            ("status", "ON"),
        ],
    )
    .await
    .expect("add_sensor failed");

    sensor_nodes::Entity::find()
        .all(db)
        .await
        .expect("sensor query failed")
        .into_iter()
        .rfind(|s| s.ip == sensor_ip)
        .expect("sensor not stored")
        .id
}

/// Rows in (buildings, cluster_nodes, sensor_nodes).
pub async fn counts(db: &DatabaseConnection) -> (u64, u64, u64) {
    (
        buildings::Entity::find().count(db).await.expect("count buildings"),
        cluster_nodes::Entity::find().count(db).await.expect("count clusters"),
        sensor_nodes::Entity::find().count(db).await.expect("count sensors"),
    )
}

pub struct Reading<'a> {
    pub sensor_id: i32,
    pub cluster_id: i32,
    pub building_id: i32,
    pub floor: i32,
    pub room: &'a str,
    pub date: &'a str,
    pub time: &'a str,
    pub status: &'a str,
}

impl Default for Reading<'_> {
    fn default() -> Self {
        Self {
            sensor_id: 1,
            cluster_id: 1,
            building_id: 1,
            floor: 0,
            room: "101",
            date: "2020-01-15",
            time: "08:00",
            status: "ON",
        }
    }
}

/// Write a log record the way the ingestion path would.
pub async fn insert_reading(db: &DatabaseConnection, reading: Reading<'_>) -> sensor_data::Model {
    let model = sensor_data::ActiveModel {
        sensor_id: Set(reading.sensor_id),
        cluster_id: Set(reading.cluster_id),
        building_id: Set(reading.building_id),
        temperature: Set(21.5),
        floor: Set(reading.floor),
        room: Set(reading.room.to_string()),
        date: Set(NaiveDate::parse_from_str(reading.date, "%Y-%m-%d").expect("bad date")),
        time: Set(NaiveTime::parse_from_str(reading.time, "%H:%M").expect("bad time")),
        status: Set(reading.status.to_string()),
        ..Default::default()
    };
    sensor_data::Entity::insert(model)
        .exec_with_returning(db)
        .await
        .expect("insert reading failed")
}
