//! Hierarchy invariants checked before every mutation.
//!
//! The dispatcher runs these inside the request transaction; any error drops
//! the transaction before a write is issued.

use std::net::IpAddr;

use sea_orm::{ColumnTrait, Condition, ConnectionTrait};

use crate::entity::{buildings, cluster_nodes, sensor_nodes};
use crate::error::{AppError, AppResult};
use crate::store;

/// Floors are counted from the ground floor at 0.
pub fn validate_floor(field: &'static str, floor: i32) -> AppResult<i32> {
    if floor < 0 {
        return Err(AppError::invalid(field, format!("floor must be >= 0, got {floor}")));
    }
    Ok(floor)
}

/// Node addresses must be literal IPv4 or IPv6 addresses.
pub fn validate_ip(field: &'static str, ip: &str) -> AppResult<String> {
    ip.parse::<IpAddr>()
        .map(|addr| addr.to_string())
        .map_err(|_| AppError::invalid(field, format!("'{ip}' is not an IP address")))
}

/// Canonical form of a submitted lookup address.
///
/// Keys are stored normalized by [`validate_ip`], so lookups must compare in
/// the same form. Unparseable input is only trimmed and will not match.
#[must_use]
pub fn normalize_ip(ip: &str) -> String {
    let ip = ip.trim();
    ip.parse::<IpAddr>()
        .map_or_else(|_| ip.to_string(), |addr| addr.to_string())
}

/// Resolve a building that a child row is about to reference.
pub async fn referenced_building<C: ConnectionTrait>(
    conn: &C,
    building_id: i32,
) -> AppResult<buildings::Model> {
    match store::get::<buildings::Entity, _>(conn, building_id).await {
        Err(AppError::NotFound(_)) => Err(AppError::ForeignKeyViolation(format!(
            "building {building_id} does not exist"
        ))),
        other => other,
    }
}

/// (building_id, floor, ip) must not name another cluster.
pub async fn cluster_key_free<C: ConnectionTrait>(
    conn: &C,
    building_id: i32,
    floor: i32,
    ip: &str,
    except_id: Option<i32>,
) -> AppResult<()> {
    let mut condition = Condition::all()
        .add(cluster_nodes::Column::BuildingId.eq(building_id))
        .add(cluster_nodes::Column::Floor.eq(floor))
        .add(cluster_nodes::Column::Ip.eq(ip));
    if let Some(id) = except_id {
        condition = condition.add(cluster_nodes::Column::Id.ne(id));
    }

    let existing =
        store::first::<cluster_nodes::Entity, _>(conn, condition, cluster_nodes::Column::Id)
            .await?;
    match existing {
        Some(cluster) => Err(AppError::DuplicateKey(format!(
            "cluster {ip} already exists on floor {floor} of building {building_id} (id {})",
            cluster.id
        ))),
        None => Ok(()),
    }
}

/// (cluster_id, ip) must not name another sensor.
pub async fn sensor_key_free<C: ConnectionTrait>(
    conn: &C,
    cluster_id: i32,
    ip: &str,
    except_id: Option<i32>,
) -> AppResult<()> {
    let mut condition = Condition::all()
        .add(sensor_nodes::Column::ClusterId.eq(cluster_id))
        .add(sensor_nodes::Column::Ip.eq(ip));
    if let Some(id) = except_id {
        condition = condition.add(sensor_nodes::Column::Id.ne(id));
    }

    let existing =
        store::first::<sensor_nodes::Entity, _>(conn, condition, sensor_nodes::Column::Id).await?;
    match existing {
        Some(sensor) => Err(AppError::DuplicateKey(format!(
            "sensor {ip} already exists in cluster {cluster_id} (id {})",
            sensor.id
        ))),
        None => Ok(()),
    }
}
