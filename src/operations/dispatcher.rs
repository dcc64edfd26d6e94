use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    IntoActiveModel, TransactionTrait,
};

use crate::access::AccessLevel;
use crate::entity::{buildings, cluster_nodes, sensor_nodes};
use crate::error::{AppError, AppResult};
use crate::geocoding::{Coordinate, Geocoder};
use crate::integrity;
use crate::query::{self, ClusterResponse, SensorResponse};
use crate::store;

use super::request::{
    AddBuilding, AddCluster, AddSensor, ClusterKey, EditBuilding, EditCluster, EditSensor,
    Operation, OperationKind, OperationRequest, RemoveSensor,
};
use super::{CascadePolicy, RemovalPolicy};

pub const DEFAULT_GEOCODE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a dispatched operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    /// Mutation committed, nothing to report.
    Ack,
    /// Mutation committed; the caller gets the commit time.
    Timestamp(DateTime<Utc>),
    Clusters(Vec<ClusterResponse>),
    Sensors(Vec<SensorResponse>),
    /// The tag named no known operation. Nothing was touched.
    Unrecognized {
        operation: String,
        time: DateTime<Utc>,
    },
}

impl OperationOutcome {
    /// Whether the store may have changed.
    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Ack | Self::Timestamp(_))
    }
}

/// Applies hierarchy operations against an injected store.
pub struct Dispatcher {
    db: DatabaseConnection,
    geocoder: Arc<dyn Geocoder>,
    policy: RemovalPolicy,
    geocode_timeout: Duration,
}

impl Dispatcher {
    #[must_use]
    pub fn new(db: DatabaseConnection, geocoder: Arc<dyn Geocoder>, policy: RemovalPolicy) -> Self {
        Self {
            db,
            geocoder,
            policy,
            geocode_timeout: DEFAULT_GEOCODE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_geocode_timeout(mut self, timeout: Duration) -> Self {
        self.geocode_timeout = timeout;
        self
    }

    #[must_use]
    pub fn policy(&self) -> RemovalPolicy {
        self.policy
    }

    /// Gate, parse and apply one request.
    ///
    /// Unknown tags come back as [`OperationOutcome::Unrecognized`]. Access is
    /// checked before fields are parsed, and fields are parsed before the
    /// store is touched.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `MissingField` or `InvalidField` before any store access;
    /// `NotFound`, `DuplicateKey` or `ForeignKeyViolation` from the integrity
    /// checks, in which case the transaction is rolled back.
    pub async fn dispatch(
        &self,
        access: AccessLevel,
        request: &OperationRequest,
    ) -> AppResult<OperationOutcome> {
        let Some(kind) = OperationKind::parse(&request.kind) else {
            tracing::warn!(operation = %request.kind, "Unrecognized operation");
            return Ok(OperationOutcome::Unrecognized {
                operation: request.kind.clone(),
                time: Utc::now(),
            });
        };

        access.require(kind.required_access(), kind.name())?;
        let operation = Operation::parse(kind, &request.fields)?;
        self.execute(operation).await
    }

    /// Apply an already parsed operation in its own transaction.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub async fn execute(&self, operation: Operation) -> AppResult<OperationOutcome> {
        let kind = operation.kind();

        // The only network-bound step runs before the transaction opens.
        let coordinate = match &operation {
            Operation::AddBuilding(add) => Some(self.locate(&add.full_address()).await),
            _ => None,
        };

        let txn = self.db.begin().await?;
        let outcome = match operation {
            Operation::AddBuilding(add) => {
                add_building(&txn, add, coordinate.unwrap_or(Coordinate::SENTINEL)).await?
            }
            Operation::EditBuilding(edit) => edit_building(&txn, edit).await?,
            Operation::RemoveBuilding { building_id } => {
                remove_building(&txn, building_id, self.policy.building).await?
            }
            Operation::AddCluster(add) => add_cluster(&txn, add).await?,
            Operation::EditCluster(edit) => edit_cluster(&txn, edit).await?,
            Operation::RemoveCluster(key) => {
                remove_cluster(&txn, &key, self.policy.cluster).await?
            }
            Operation::AddSensor(add) => add_sensor(&txn, add).await?,
            Operation::EditSensor(edit) => edit_sensor(&txn, edit).await?,
            Operation::RemoveSensor(remove) => remove_sensor(&txn, remove).await?,
            Operation::GetCluster { building_id } => OperationOutcome::Clusters(
                query::clusters_for_building(&txn, building_id)
                    .await?
                    .into_iter()
                    .map(Into::into)
                    .collect(),
            ),
            Operation::GetSensor { cluster_id } => OperationOutcome::Sensors(
                query::sensors_for_cluster(&txn, cluster_id)
                    .await?
                    .into_iter()
                    .map(Into::into)
                    .collect(),
            ),
        };
        txn.commit().await?;

        tracing::debug!(operation = kind.name(), "Operation committed");
        Ok(outcome)
    }

    /// Geocode an address, degrading to the sentinel on any failure.
    async fn locate(&self, address: &str) -> Coordinate {
        match tokio::time::timeout(self.geocode_timeout, self.geocoder.geocode(address)).await {
            Ok(Ok(Some(coordinate))) => coordinate,
            Ok(Ok(None)) => {
                tracing::info!(address, "Address not found, storing sentinel coordinate");
                Coordinate::SENTINEL
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    address,
                    error = %e,
                    "Geocoding failed, storing sentinel coordinate"
                );
                Coordinate::SENTINEL
            }
            Err(_) => {
                tracing::warn!(
                    address,
                    timeout_ms = self.geocode_timeout.as_millis() as u64,
                    "Geocoding timed out, storing sentinel coordinate"
                );
                Coordinate::SENTINEL
            }
        }
    }
}

async fn add_building(
    txn: &DatabaseTransaction,
    add: AddBuilding,
    coordinate: Coordinate,
) -> AppResult<OperationOutcome> {
    let building = store::insert(
        txn,
        buildings::ActiveModel {
            name: Set(add.name),
            lat: Set(coordinate.lat),
            lng: Set(coordinate.lng),
            floors: Set(add.floors),
            owner: Set(add.owner),
            comment: Set(add.comment),
            address: Set(Some(add.address)),
            city: Set(Some(add.city)),
            state: Set(Some(add.state)),
            zip_code: Set(Some(add.zip)),
            ..Default::default()
        },
    )
    .await?;

    tracing::info!(
        building_id = building.id,
        lat = building.lat,
        lng = building.lng,
        "Building added"
    );
    Ok(OperationOutcome::Ack)
}

async fn edit_building(
    txn: &DatabaseTransaction,
    edit: EditBuilding,
) -> AppResult<OperationOutcome> {
    let building = store::get::<buildings::Entity, _>(txn, edit.building_id).await?;
    let mut active = building.into_active_model();

    if let Some(name) = edit.new_name {
        active.name = Set(name);
    }
    if let Some(address) = edit.address {
        active.address = Set(Some(address));
    }
    if let Some(city) = edit.city {
        active.city = Set(Some(city));
    }
    if let Some(state) = edit.state {
        active.state = Set(Some(state));
    }
    if let Some(zip) = edit.zip {
        active.zip_code = Set(Some(zip));
    }
    if let Some(floors) = edit.floors {
        active.floors = Set(Some(floors));
    }
    if let Some(owner) = edit.owner {
        active.owner = Set(Some(owner));
    }
    if let Some(comment) = edit.comment {
        active.comment = Set(Some(comment));
    }

    store::update(txn, active).await?;
    tracing::info!(building_id = edit.building_id, "Building edited");
    Ok(OperationOutcome::Ack)
}

async fn remove_building(
    txn: &DatabaseTransaction,
    building_id: i32,
    policy: CascadePolicy,
) -> AppResult<OperationOutcome> {
    store::get::<buildings::Entity, _>(txn, building_id).await?;

    let mut clusters_removed = 0;
    let mut sensors_removed = 0;
    if policy == CascadePolicy::Cascade {
        let cluster_ids: Vec<i32> = query::clusters_for_building(txn, building_id)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();
        if !cluster_ids.is_empty() {
            sensors_removed = store::delete::<sensor_nodes::Entity, _>(
                txn,
                Condition::all().add(sensor_nodes::Column::ClusterId.is_in(cluster_ids)),
            )
            .await?;
        }
        clusters_removed = store::delete::<cluster_nodes::Entity, _>(
            txn,
            Condition::all().add(cluster_nodes::Column::BuildingId.eq(building_id)),
        )
        .await?;
    }

    store::delete::<buildings::Entity, _>(
        txn,
        Condition::all().add(buildings::Column::Id.eq(building_id)),
    )
    .await?;

    tracing::info!(
        building_id,
        %policy,
        clusters_removed,
        sensors_removed,
        "Building removed"
    );
    Ok(OperationOutcome::Timestamp(Utc::now()))
}

async fn add_cluster(txn: &DatabaseTransaction, add: AddCluster) -> AppResult<OperationOutcome> {
    integrity::referenced_building(txn, add.building_id).await?;
    integrity::cluster_key_free(txn, add.building_id, add.floor, &add.ip, None).await?;

    let cluster = store::insert(
        txn,
        cluster_nodes::ActiveModel {
            building_id: Set(add.building_id),
            floor: Set(add.floor),
            ip: Set(add.ip),
            comment: Set(add.comment),
            ..Default::default()
        },
    )
    .await?;

    tracing::info!(
        cluster_id = cluster.id,
        building_id = cluster.building_id,
        floor = cluster.floor,
        ip = %cluster.ip,
        "Cluster added"
    );
    Ok(OperationOutcome::Ack)
}

async fn edit_cluster(txn: &DatabaseTransaction, edit: EditCluster) -> AppResult<OperationOutcome> {
    let cluster = find_cluster(txn, &edit.key).await?;

    let building_id = match edit.new_building_id {
        Some(id) => integrity::referenced_building(txn, id).await?.id,
        None => cluster.building_id,
    };
    let floor = edit.new_floor.unwrap_or(cluster.floor);
    let ip = edit.new_ip.unwrap_or_else(|| cluster.ip.clone());

    let current = (cluster.building_id, cluster.floor, cluster.ip.as_str());
    if (building_id, floor, ip.as_str()) == current {
        tracing::debug!(cluster_id = cluster.id, "Cluster edit changes nothing");
        return Ok(OperationOutcome::Ack);
    }
    integrity::cluster_key_free(txn, building_id, floor, &ip, Some(cluster.id)).await?;

    let cluster_id = cluster.id;
    let mut active = cluster.into_active_model();
    active.building_id = Set(building_id);
    active.floor = Set(floor);
    active.ip = Set(ip);
    store::update(txn, active).await?;

    tracing::info!(cluster_id, building_id, floor, "Cluster edited");
    Ok(OperationOutcome::Ack)
}

async fn remove_cluster(
    txn: &DatabaseTransaction,
    key: &ClusterKey,
    policy: CascadePolicy,
) -> AppResult<OperationOutcome> {
    let cluster = find_cluster(txn, key).await?;

    let sensors_affected = match policy {
        CascadePolicy::Cascade => {
            store::delete::<sensor_nodes::Entity, _>(
                txn,
                Condition::all().add(sensor_nodes::Column::ClusterId.eq(cluster.id)),
            )
            .await?
        }
        CascadePolicy::Orphan => query::sensors_for_cluster(txn, cluster.id).await?.len() as u64,
    };

    let clusters_removed =
        store::delete::<cluster_nodes::Entity, _>(txn, cluster_key_condition(key)).await?;

    tracing::info!(
        cluster_id = cluster.id,
        %policy,
        clusters_removed,
        sensors_affected,
        "Cluster removed"
    );
    Ok(OperationOutcome::Timestamp(Utc::now()))
}

async fn add_sensor(txn: &DatabaseTransaction, add: AddSensor) -> AppResult<OperationOutcome> {
    let cluster = store::first::<cluster_nodes::Entity, _>(
        txn,
        Condition::all()
            .add(cluster_nodes::Column::BuildingId.eq(add.building_id))
            .add(cluster_nodes::Column::Ip.eq(add.cluster_ip.as_str())),
        cluster_nodes::Column::Id,
    )
    .await?
    .ok_or_else(|| {
        AppError::NotFound(format!(
            "cluster {} not found in building {}",
            add.cluster_ip, add.building_id
        ))
    })?;

    integrity::sensor_key_free(txn, cluster.id, &add.sensor_ip, None).await?;

    let sensor = store::insert(
        txn,
        sensor_nodes::ActiveModel {
            cluster_id: Set(cluster.id),
            ip: Set(add.sensor_ip),
            room: Set(add.room),
            floor: Set(Some(cluster.floor)),
            sensor_type: Set(add.sensor_type),
            status: Set(add.status),
            ..Default::default()
        },
    )
    .await?;

    tracing::info!(
        sensor_id = sensor.id,
        cluster_id = sensor.cluster_id,
        ip = %sensor.ip,
        status = %sensor.status,
        "Sensor added"
    );
    Ok(OperationOutcome::Ack)
}

async fn edit_sensor(txn: &DatabaseTransaction, edit: EditSensor) -> AppResult<OperationOutcome> {
    let cluster = find_cluster(txn, &edit.cluster).await?;
    let sensor = store::first::<sensor_nodes::Entity, _>(
        txn,
        Condition::all().add(sensor_nodes::Column::ClusterId.eq(cluster.id)),
        sensor_nodes::Column::Id,
    )
    .await?
    .ok_or_else(|| AppError::NotFound(format!("cluster {} has no sensors", cluster.id)))?;

    // Reassignment needs both halves of the target location.
    let target = match (edit.new_building_id, edit.new_floor) {
        (Some(building_id), Some(floor)) => {
            let mut condition = Condition::all()
                .add(cluster_nodes::Column::BuildingId.eq(building_id))
                .add(cluster_nodes::Column::Floor.eq(floor));
            if let Some(ip) = &edit.new_cluster_ip {
                condition = condition.add(cluster_nodes::Column::Ip.eq(ip.as_str()));
            }
            let target =
                store::first::<cluster_nodes::Entity, _>(txn, condition, cluster_nodes::Column::Id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!(
                            "no cluster on floor {floor} of building {building_id}{}",
                            edit.new_cluster_ip
                                .as_deref()
                                .map(|ip| format!(" with ip {ip}"))
                                .unwrap_or_default()
                        ))
                    })?;
            Some(target)
        }
        (None, None) => None,
        _ => {
            tracing::debug!(
                sensor_id = sensor.id,
                "Sensor reassignment needs both new_building_id and new_floor, skipping"
            );
            None
        }
    };

    if target.is_none() && edit.new_sensor_ip.is_none() {
        tracing::debug!(sensor_id = sensor.id, "Sensor edit changes nothing");
        return Ok(OperationOutcome::Ack);
    }

    let cluster_id = target.as_ref().map_or(sensor.cluster_id, |c| c.id);
    let ip = edit.new_sensor_ip.unwrap_or_else(|| sensor.ip.clone());
    integrity::sensor_key_free(txn, cluster_id, &ip, Some(sensor.id)).await?;

    let sensor_id = sensor.id;
    let from_cluster = sensor.cluster_id;
    let mut active = sensor.into_active_model();
    if let Some(target) = &target {
        active.cluster_id = Set(target.id);
        active.floor = Set(Some(target.floor));
    }
    active.ip = Set(ip);
    store::update(txn, active).await?;

    tracing::info!(
        sensor_id,
        from_cluster,
        to_cluster = cluster_id,
        "Sensor edited"
    );
    Ok(OperationOutcome::Ack)
}

async fn remove_sensor(
    txn: &DatabaseTransaction,
    remove: RemoveSensor,
) -> AppResult<OperationOutcome> {
    let cluster = find_cluster(txn, &remove.cluster).await?;

    let removed = store::delete::<sensor_nodes::Entity, _>(
        txn,
        Condition::all()
            .add(sensor_nodes::Column::ClusterId.eq(cluster.id))
            .add(sensor_nodes::Column::Ip.eq(remove.sensor_ip.as_str())),
    )
    .await?;
    if removed == 0 {
        return Err(AppError::NotFound(format!(
            "sensor {} not found in cluster {}",
            remove.sensor_ip, cluster.id
        )));
    }

    tracing::info!(cluster_id = cluster.id, ip = %remove.sensor_ip, "Sensor removed");
    Ok(OperationOutcome::Ack)
}

fn cluster_key_condition(key: &ClusterKey) -> Condition {
    Condition::all()
        .add(cluster_nodes::Column::BuildingId.eq(key.building_id))
        .add(cluster_nodes::Column::Floor.eq(key.floor))
        .add(cluster_nodes::Column::Ip.eq(key.ip.as_str()))
}

async fn find_cluster(
    txn: &DatabaseTransaction,
    key: &ClusterKey,
) -> AppResult<cluster_nodes::Model> {
    store::first::<cluster_nodes::Entity, _>(
        txn,
        cluster_key_condition(key),
        cluster_nodes::Column::Id,
    )
    .await?
    .ok_or_else(|| {
        AppError::NotFound(format!(
            "cluster {} not found on floor {} of building {}",
            key.ip, key.floor, key.building_id
        ))
    })
}
