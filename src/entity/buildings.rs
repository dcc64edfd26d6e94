use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "buildings")]
pub struct Model {
    #[sea_orm(primary_key)]
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

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cluster_nodes::Entity")]
    ClusterNodes,
}

impl Related<super::cluster_nodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClusterNodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
