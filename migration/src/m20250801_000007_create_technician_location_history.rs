use sea_orm_migration::{prelude::*, schema::*};

use super::m20250801_000003_create_technicians::Technician;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Append-only log; rows are never updated or deleted by the application
        manager
            .create_table(
                Table::create()
                    .table(TechnicianLocationHistory::Table)
                    .if_not_exists()
                    .col(uuid(TechnicianLocationHistory::Id).primary_key())
                    .col(uuid(TechnicianLocationHistory::TechnicianId).not_null())
                    .col(double(TechnicianLocationHistory::Latitude).not_null())
                    .col(double(TechnicianLocationHistory::Longitude).not_null())
                    .col(double_null(TechnicianLocationHistory::Accuracy))
                    .col(double_null(TechnicianLocationHistory::Heading))
                    .col(double_null(TechnicianLocationHistory::Speed))
                    .col(
                        timestamp_with_time_zone(TechnicianLocationHistory::RecordedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_location_history_technician")
                            .from(
                                TechnicianLocationHistory::Table,
                                TechnicianLocationHistory::TechnicianId,
                            )
                            .to(Technician::Table, Technician::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_location_history_technician")
                    .table(TechnicianLocationHistory::Table)
                    .col(TechnicianLocationHistory::TechnicianId)
                    .col(TechnicianLocationHistory::RecordedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TechnicianLocationHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TechnicianLocationHistory {
    Table,
    Id,
    TechnicianId,
    Latitude,
    Longitude,
    Accuracy,
    Heading,
    Speed,
    RecordedAt,
}
