use sea_orm::{ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait};

use crate::entity::{buildings, cluster_nodes, sensor_nodes};
use crate::error::AppResult;
use crate::store;

/// Clusters of one building, lowest floor first.
pub async fn clusters_for_building<C: ConnectionTrait>(
    conn: &C,
    building_id: i32,
) -> AppResult<Vec<cluster_nodes::Model>> {
    store::list::<cluster_nodes::Entity, _>(
        conn,
        Condition::all().add(cluster_nodes::Column::BuildingId.eq(building_id)),
        &[cluster_nodes::Column::Floor, cluster_nodes::Column::Id],
    )
    .await
}

/// Sensors attached to one cluster, in creation order.
pub async fn sensors_for_cluster<C: ConnectionTrait>(
    conn: &C,
    cluster_id: i32,
) -> AppResult<Vec<sensor_nodes::Model>> {
    store::list::<sensor_nodes::Entity, _>(
        conn,
        Condition::all().add(sensor_nodes::Column::ClusterId.eq(cluster_id)),
        &[sensor_nodes::Column::Id],
    )
    .await
}

pub async fn list_buildings<C: ConnectionTrait>(conn: &C) -> AppResult<Vec<buildings::Model>> {
    store::list::<buildings::Entity, _>(conn, Condition::all(), &[buildings::Column::Id]).await
}

pub async fn count_sensor_nodes<C: ConnectionTrait>(conn: &C) -> AppResult<u64> {
    Ok(sensor_nodes::Entity::find().count(conn).await?)
}
