//! Read side: tree reads, the sensor log filter and dashboard aggregates.

pub mod log;
pub mod tree;
pub mod types;

pub use log::{LogFilter, LogFilterForm, dashboard_summary, filter_log, log_indexes};
pub use tree::{clusters_for_building, count_sensor_nodes, list_buildings, sensors_for_cluster};
pub use types::{
    BillingSummary, BuildingResponse, ClusterResponse, DashboardSummary, LogIndexes,
    SensorLogEntry, SensorResponse,
};
