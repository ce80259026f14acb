use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{EntityTrait, Schema};

#[derive(DeriveMigrationName)]
pub struct Migration;

async fn create_table<E: EntityTrait>(
    manager: &SchemaManager<'_>,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    manager
        .create_table(
            schema
                .create_table_from_entity(entity)
                .if_not_exists()
                .to_owned(),
        )
        .await
}

async fn drop_table<E: EntityTrait>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr> {
    manager
        .drop_table(Table::drop().table(entity).if_exists().to_owned())
        .await
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        create_table(manager, &schema, Users).await?;
        create_table(manager, &schema, Profiles).await?;
        create_table(manager, &schema, UserRoles).await?;
        create_table(manager, &schema, Computers).await?;
        create_table(manager, &schema, Software).await?;
        create_table(manager, &schema, ComputerSoftware).await?;
        create_table(manager, &schema, Bookings).await?;
        create_table(manager, &schema, SessionLogs).await?;
        create_table(manager, &schema, Issues).await?;
        create_table(manager, &schema, MaintenanceLogs).await?;
        create_table(manager, &schema, LabNotices).await?;
        create_table(manager, &schema, Notifications).await?;
        create_table(manager, &schema, SystemLogs).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_computer_software_unique")
                    .table(ComputerSoftware)
                    .col(crate::entities::computer_software::Column::ComputerId)
                    .col(crate::entities::computer_software::Column::SoftwareId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_computer_start")
                    .table(Bookings)
                    .col(crate::entities::bookings::Column::ComputerId)
                    .col(crate::entities::bookings::Column::StartTime)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_issues_created_at")
                    .table(Issues)
                    .col(crate::entities::issues::Column::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_table(manager, SystemLogs).await?;
        drop_table(manager, Notifications).await?;
        drop_table(manager, LabNotices).await?;
        drop_table(manager, MaintenanceLogs).await?;
        drop_table(manager, Issues).await?;
        drop_table(manager, SessionLogs).await?;
        drop_table(manager, Bookings).await?;
        drop_table(manager, ComputerSoftware).await?;
        drop_table(manager, Software).await?;
        drop_table(manager, Computers).await?;
        drop_table(manager, UserRoles).await?;
        drop_table(manager, Profiles).await?;
        drop_table(manager, Users).await?;

        Ok(())
    }
}
