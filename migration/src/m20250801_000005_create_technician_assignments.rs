use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20250801_000003_create_technicians::Technician;
use super::m20250801_000004_create_bookings::Booking;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(AssignmentResponse::Enum)
                    .values([
                        AssignmentResponse::Pending,
                        AssignmentResponse::Accepted,
                        AssignmentResponse::Declined,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TechnicianAssignment::Table)
                    .if_not_exists()
                    .col(uuid(TechnicianAssignment::Id).primary_key())
                    .col(uuid(TechnicianAssignment::BookingId).not_null())
                    .col(uuid(TechnicianAssignment::TechnicianId).not_null())
                    .col(
                        ColumnDef::new(TechnicianAssignment::Response)
                            .custom(AssignmentResponse::Enum)
                            .not_null(),
                    )
                    .col(timestamp_with_time_zone_null(TechnicianAssignment::RespondedAt))
                    .col(timestamp_with_time_zone_null(TechnicianAssignment::EstimatedArrival))
                    .col(string_len_null(TechnicianAssignment::DeclineReason, 200))
                    .col(
                        timestamp_with_time_zone(TechnicianAssignment::AssignedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_booking")
                            .from(TechnicianAssignment::Table, TechnicianAssignment::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_technician")
                            .from(TechnicianAssignment::Table, TechnicianAssignment::TechnicianId)
                            .to(Technician::Table, Technician::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TechnicianAssignment::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(AssignmentResponse::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TechnicianAssignment {
    Table,
    Id,
    BookingId,
    TechnicianId,
    Response,
    RespondedAt,
    EstimatedArrival,
    DeclineReason,
    AssignedAt,
}

#[derive(DeriveIden)]
pub enum AssignmentResponse {
    #[sea_orm(iden = "assignment_response")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "accepted")]
    Accepted,
    #[sea_orm(iden = "declined")]
    Declined,
}
