use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reported operating state of a sensor node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SensorStatus {
    #[sea_orm(string_value = "ON")]
    #[serde(rename = "ON")]
    On,
    #[sea_orm(string_value = "OFF")]
    #[serde(rename = "OFF")]
    Off,
    #[sea_orm(string_value = "unknown")]
    #[serde(rename = "unknown")]
    Unknown,
}

impl FromStr for SensorStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "unknown" => Ok(Self::Unknown),
            _ => Err(()),
        }
    }
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Unknown => "unknown",
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sensor_nodes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub cluster_id: i32,
    pub ip: String,
    pub room: Option<String>,
    pub floor: Option<i32>,
    #[sea_orm(column_name = "type")]
    pub sensor_type: Option<String>,
    pub status: SensorStatus,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cluster_nodes::Entity",
        from = "Column::ClusterId",
        to = "super::cluster_nodes::Column::Id"
    )]
    ClusterNode,
}

impl Related<super::cluster_nodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClusterNode.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
