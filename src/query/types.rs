use serde::Serialize;
use utoipa::ToSchema;

use crate::entity::sensor_nodes::SensorStatus;
use crate::entity::{buildings, cluster_nodes, sensor_data, sensor_nodes};

/// Log dates and times travel as fixed-format strings.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BuildingResponse {
    pub id: i32,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub floors: Option<i32>,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

impl From<buildings::Model> for BuildingResponse {
    fn from(b: buildings::Model) -> Self {
        Self {
            id: b.id,
            name: b.name,
            lat: b.lat,
            lng: b.lng,
            floors: b.floors,
            owner: b.owner,
            comment: b.comment,
            address: b.address,
            city: b.city,
            state: b.state,
            zip_code: b.zip_code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ClusterResponse {
    pub id: i32,
    pub building_id: i32,
    pub floor: i32,
    pub ip: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub comment: Option<String>,
}

impl From<cluster_nodes::Model> for ClusterResponse {
    fn from(c: cluster_nodes::Model) -> Self {
        Self {
            id: c.id,
            building_id: c.building_id,
            floor: c.floor,
            ip: c.ip,
            lat: c.lat,
            lng: c.lng,
            comment: c.comment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SensorResponse {
    pub id: i32,
    pub cluster_id: i32,
    pub ip: String,
    pub room: Option<String>,
    pub floor: Option<i32>,
    #[serde(rename = "type")]
    pub sensor_type: Option<String>,
    #[schema(value_type = String, example = "ON")]
    pub status: SensorStatus,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl From<sensor_nodes::Model> for SensorResponse {
    fn from(s: sensor_nodes::Model) -> Self {
        Self {
            id: s.id,
            cluster_id: s.cluster_id,
            ip: s.ip,
            room: s.room,
            floor: s.floor,
            sensor_type: s.sensor_type,
            status: s.status,
            lat: s.lat,
            lng: s.lng,
        }
    }
}

/// One sensor log record ready for transport.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SensorLogEntry {
    pub id: i32,
    pub sensor_id: i32,
    pub cluster_id: i32,
    pub building_id: i32,
    pub temperature: f64,
    pub floor: i32,
    pub room: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub status: String,
}

impl From<sensor_data::Model> for SensorLogEntry {
    fn from(r: sensor_data::Model) -> Self {
        Self {
            id: r.id,
            sensor_id: r.sensor_id,
            cluster_id: r.cluster_id,
            building_id: r.building_id,
            temperature: r.temperature,
            floor: r.floor,
            room: r.room,
            date: r.date.format(DATE_FORMAT).to_string(),
            time: r.time.format(TIME_FORMAT).to_string(),
            status: r.status,
        }
    }
}

/// Distinct values present in the sensor log, for filter pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LogIndexes {
    pub buildings: Vec<i32>,
    pub floors: Vec<i32>,
    pub rooms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardSummary {
    /// Distinct sensors with at least one log record
    pub sensors_reporting: usize,
    /// Reporting sensors whose first record has status `ON`
    pub sensors_active: usize,
    pub clusters_reporting: usize,
    pub buildings_reporting: usize,
    pub buildings: Vec<BuildingResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BillingSummary {
    pub sensor_nodes: u64,
}
