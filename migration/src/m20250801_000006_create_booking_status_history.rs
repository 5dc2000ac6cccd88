use sea_orm_migration::{prelude::*, schema::*};

use super::m20250801_000004_create_bookings::{Booking, BookingStatus};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BookingStatusHistory::Table)
                    .if_not_exists()
                    .col(uuid(BookingStatusHistory::Id).primary_key())
                    .col(uuid(BookingStatusHistory::BookingId).not_null())
                    .col(
                        ColumnDef::new(BookingStatusHistory::OldStatus)
                            .custom(BookingStatus::Enum)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(BookingStatusHistory::NewStatus)
                            .custom(BookingStatus::Enum)
                            .not_null(),
                    )
                    .col(uuid_null(BookingStatusHistory::ChangedBy))
                    .col(string_null(BookingStatusHistory::Notes))
                    .col(
                        timestamp_with_time_zone(BookingStatusHistory::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_status_history_booking")
                            .from(BookingStatusHistory::Table, BookingStatusHistory::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BookingStatusHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum BookingStatusHistory {
    Table,
    Id,
    BookingId,
    OldStatus,
    NewStatus,
    ChangedBy,
    Notes,
    CreatedAt,
}
