use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cluster_nodes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub building_id: i32,
    pub floor: i32,
    pub ip: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub comment: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::buildings::Entity",
        from = "Column::BuildingId",
        to = "super::buildings::Column::Id"
    )]
    Building,
    #[sea_orm(has_many = "super::sensor_nodes::Entity")]
    SensorNodes,
}

impl Related<super::buildings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Building.def()
    }
}

impl Related<super::sensor_nodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SensorNodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
