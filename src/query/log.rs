//! Ad-hoc filtering over the append-only sensor log.
//!
//! Date bounds are **exclusive** on both ends: a record dated exactly on
//! `start_date` or `end_date` is never returned. Callers asking for the whole
//! of January must pass `start_date = <Dec 31>` and `end_date = <Feb 1>`.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryOrder, QuerySelect};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::entity::sensor_data;
use crate::error::{AppError, AppResult};
use crate::query::tree;
use crate::query::types::{DATE_FORMAT, DashboardSummary, LogIndexes, SensorLogEntry};
use crate::store;

/// Log filter as submitted by a form or query string. Blank means "any".
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct LogFilterForm {
    /// Building id
    #[serde(default)]
    pub building: Option<String>,
    /// Floor number
    #[serde(default)]
    pub floor: Option<String>,
    /// Room label
    #[serde(default)]
    pub room: Option<String>,
    /// Exclusive lower bound, `YYYY-MM-DD`
    #[serde(default)]
    pub start_date: Option<String>,
    /// Exclusive upper bound, `YYYY-MM-DD`
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Typed log filter; every supplied constraint is ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub building: Option<i32>,
    pub floor: Option<i32>,
    pub room: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TryFrom<LogFilterForm> for LogFilter {
    type Error = AppError;

    fn try_from(form: LogFilterForm) -> AppResult<Self> {
        Ok(Self {
            building: parse_opt(form.building, "building", |v| v.parse().ok())?,
            floor: parse_opt(form.floor, "floor", |v| v.parse().ok())?,
            room: present(form.room),
            start_date: parse_opt(form.start_date, "start_date", parse_date)?,
            end_date: parse_opt(form.end_date, "end_date", parse_date)?,
        })
    }
}

impl LogFilter {
    #[must_use]
    pub fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(building) = self.building {
            condition = condition.add(sensor_data::Column::BuildingId.eq(building));
        }
        if let Some(floor) = self.floor {
            condition = condition.add(sensor_data::Column::Floor.eq(floor));
        }
        if let Some(room) = &self.room {
            condition = condition.add(sensor_data::Column::Room.eq(room.as_str()));
        }
        if let Some(start) = self.start_date {
            condition = condition.add(sensor_data::Column::Date.gt(start));
        }
        if let Some(end) = self.end_date {
            condition = condition.add(sensor_data::Column::Date.lt(end));
        }
        condition
    }
}

/// Every log record matching `filter`, oldest first.
pub async fn filter_log<C: ConnectionTrait>(
    conn: &C,
    filter: &LogFilter,
) -> AppResult<Vec<SensorLogEntry>> {
    let records = store::list::<sensor_data::Entity, _>(
        conn,
        filter.condition(),
        &[
            sensor_data::Column::Date,
            sensor_data::Column::Time,
            sensor_data::Column::Id,
        ],
    )
    .await?;

    tracing::debug!(?filter, matched = records.len(), "Sensor log filtered");

    Ok(records.into_iter().map(SensorLogEntry::from).collect())
}

/// Distinct buildings, floors and rooms present in the log, sorted numerically.
pub async fn log_indexes<C: ConnectionTrait>(conn: &C) -> AppResult<LogIndexes> {
    let mut buildings: Vec<i32> = distinct_column(conn, sensor_data::Column::BuildingId).await?;
    let mut floors: Vec<i32> = distinct_column(conn, sensor_data::Column::Floor).await?;
    let mut rooms: Vec<String> = distinct_column(conn, sensor_data::Column::Room).await?;

    buildings.sort_unstable();
    floors.sort_unstable();
    rooms.sort_by(|a, b| numeric_order(a, b));

    Ok(LogIndexes {
        buildings,
        floors,
        rooms,
    })
}

/// Reporting totals across the log plus the registered buildings.
pub async fn dashboard_summary<C: ConnectionTrait>(conn: &C) -> AppResult<DashboardSummary> {
    let rows: Vec<(i32, i32, i32, String)> = sensor_data::Entity::find()
        .select_only()
        .column(sensor_data::Column::SensorId)
        .column(sensor_data::Column::ClusterId)
        .column(sensor_data::Column::BuildingId)
        .column(sensor_data::Column::Status)
        .order_by_asc(sensor_data::Column::Id)
        .into_tuple()
        .all(conn)
        .await?;

    // A sensor counts as active by the status of its first record.
    let mut first_status: HashMap<i32, bool> = HashMap::new();
    let mut clusters = HashSet::new();
    let mut buildings = HashSet::new();
    for (sensor_id, cluster_id, building_id, status) in rows {
        first_status.entry(sensor_id).or_insert(status == "ON");
        clusters.insert(cluster_id);
        buildings.insert(building_id);
    }

    Ok(DashboardSummary {
        sensors_reporting: first_status.len(),
        sensors_active: first_status.values().filter(|active| **active).count(),
        clusters_reporting: clusters.len(),
        buildings_reporting: buildings.len(),
        buildings: tree::list_buildings(conn)
            .await?
            .into_iter()
            .map(Into::into)
            .collect(),
    })
}

async fn distinct_column<C, T>(conn: &C, column: sensor_data::Column) -> AppResult<Vec<T>>
where
    C: ConnectionTrait,
    T: sea_orm::TryGetableMany,
{
    Ok(sensor_data::Entity::find()
        .select_only()
        .column(column)
        .distinct()
        .into_tuple::<T>()
        .all(conn)
        .await?)
}

/// Numbers first in numeric order, then everything else lexically.
fn numeric_order(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_opt<T>(
    value: Option<String>,
    field: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> AppResult<Option<T>> {
    match present(value) {
        None => Ok(None),
        Some(raw) => parse(&raw)
            .map(Some)
            .ok_or_else(|| AppError::invalid(field, format!("cannot parse '{raw}'"))),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

