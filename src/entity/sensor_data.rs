use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One temperature/status reading. The ancestry columns are copies taken at
/// write time and are never rewritten when the sensor moves.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sensor_data")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sensor_id: i32,
    pub cluster_id: i32,
    pub building_id: i32,
    pub temperature: f64,
    pub floor: i32,
    pub room: String,
    pub date: Date,
    pub time: Time,
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
