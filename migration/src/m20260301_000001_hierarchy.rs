use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// Parent references are plain indexed columns. Referential integrity is
// checked by the application so that removal cascades stay explicit and the
// sensor log keeps its ancestry snapshots after nodes are removed.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========== BUILDINGS ==========
        manager
            .create_table(
                Table::create()
                    .table(Buildings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Buildings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Buildings::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Buildings::Lat).double().not_null().default(0.0))
                    .col(ColumnDef::new(Buildings::Lng).double().not_null().default(0.0))
                    .col(ColumnDef::new(Buildings::Floors).integer())
                    .col(ColumnDef::new(Buildings::Owner).string_len(255))
                    .col(ColumnDef::new(Buildings::Comment).string_len(255))
                    .col(ColumnDef::new(Buildings::Address).string_len(255))
                    .col(ColumnDef::new(Buildings::City).string_len(255))
                    .col(ColumnDef::new(Buildings::State).string_len(255))
                    .col(ColumnDef::new(Buildings::ZipCode).string_len(16))
                    .to_owned(),
            )
            .await?;

        // ========== CLUSTER NODES ==========
        manager
            .create_table(
                Table::create()
                    .table(ClusterNodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClusterNodes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClusterNodes::BuildingId).integer().not_null())
                    .col(ColumnDef::new(ClusterNodes::Floor).integer().not_null())
                    .col(ColumnDef::new(ClusterNodes::Ip).string_len(255).not_null())
                    .col(ColumnDef::new(ClusterNodes::Lat).double())
                    .col(ColumnDef::new(ClusterNodes::Lng).double())
                    .col(ColumnDef::new(ClusterNodes::Comment).string_len(255))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cluster_nodes_building_floor_ip")
                    .table(ClusterNodes::Table)
                    .col(ClusterNodes::BuildingId)
                    .col(ClusterNodes::Floor)
                    .col(ClusterNodes::Ip)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========== SENSOR NODES ==========
        manager
            .create_table(
                Table::create()
                    .table(SensorNodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SensorNodes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SensorNodes::ClusterId).integer().not_null())
                    .col(ColumnDef::new(SensorNodes::Ip).string_len(255).not_null())
                    .col(ColumnDef::new(SensorNodes::Room).string_len(255))
                    .col(ColumnDef::new(SensorNodes::Floor).integer())
                    .col(ColumnDef::new(SensorNodes::SensorType).string_len(255))
                    .col(
                        ColumnDef::new(SensorNodes::Status)
                            .string_len(16)
                            .not_null()
                            .default("unknown"),
                    )
                    .col(ColumnDef::new(SensorNodes::Lat).double())
                    .col(ColumnDef::new(SensorNodes::Lng).double())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sensor_nodes_cluster_ip")
                    .table(SensorNodes::Table)
                    .col(SensorNodes::ClusterId)
                    .col(SensorNodes::Ip)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ========== SENSOR DATA ==========
        // Append-only log written by the ingestion path
        manager
            .create_table(
                Table::create()
                    .table(SensorData::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SensorData::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SensorData::SensorId).integer().not_null())
                    .col(ColumnDef::new(SensorData::ClusterId).integer().not_null())
                    .col(ColumnDef::new(SensorData::BuildingId).integer().not_null())
                    .col(ColumnDef::new(SensorData::Temperature).double().not_null())
                    .col(ColumnDef::new(SensorData::Floor).integer().not_null())
                    .col(ColumnDef::new(SensorData::Room).string_len(255).not_null())
                    .col(ColumnDef::new(SensorData::Date).date().not_null())
                    .col(ColumnDef::new(SensorData::Time).time().not_null())
                    .col(ColumnDef::new(SensorData::Status).string_len(16).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sensor_data_building_date")
                    .table(SensorData::Table)
                    .col(SensorData::BuildingId)
                    .col(SensorData::Date)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SensorData::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SensorNodes::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ClusterNodes::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Buildings::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Buildings {
    Table,
    Id,
    Name,
    Lat,
    Lng,
    Floors,
    Owner,
    Comment,
    Address,
    City,
    State,
    ZipCode,
}

#[derive(DeriveIden)]
pub enum ClusterNodes {
    Table,
    Id,
    BuildingId,
    Floor,
    Ip,
    Lat,
    Lng,
    Comment,
}

#[derive(DeriveIden)]
pub enum SensorNodes {
    Table,
    Id,
    ClusterId,
    Ip,
    Room,
    Floor,
    #[sea_orm(iden = "type")]
    SensorType,
    Status,
    Lat,
    Lng,
}

#[derive(DeriveIden)]
pub enum SensorData {
    Table,
    Id,
    SensorId,
    ClusterId,
    BuildingId,
    Temperature,
    Floor,
    Room,
    Date,
    Time,
    Status,
}
