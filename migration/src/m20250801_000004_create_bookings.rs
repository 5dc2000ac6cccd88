use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20250801_000001_create_users::User;
use super::m20250801_000002_create_service_types::ServiceType;
use super::m20250801_000003_create_technicians::Technician;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(BookingStatus::Enum)
                    .values([
                        BookingStatus::Pending,
                        BookingStatus::Confirmed,
                        BookingStatus::TechnicianAssigned,
                        BookingStatus::TechnicianEnRoute,
                        BookingStatus::InProgress,
                        BookingStatus::Completed,
                        BookingStatus::Cancelled,
                        BookingStatus::PaymentPending,
                        BookingStatus::Paid,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(BookingPriority::Enum)
                    .values([
                        BookingPriority::Low,
                        BookingPriority::Normal,
                        BookingPriority::High,
                        BookingPriority::Emergency,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(uuid(Booking::CustomerId).not_null())
                    .col(uuid(Booking::ServiceTypeId).not_null())
                    .col(uuid_null(Booking::TechnicianId))
                    .col(string_len(Booking::CustomerName, 100).not_null())
                    .col(string_len(Booking::CustomerPhone, 30).not_null())
                    .col(string_len_null(Booking::CustomerEmail, 255))
                    .col(string_len(Booking::ServiceAddress, 500).not_null())
                    .col(double_null(Booking::ServiceLatitude))
                    .col(double_null(Booking::ServiceLongitude))
                    .col(timestamp_with_time_zone_null(Booking::PreferredDate))
                    .col(string_null(Booking::Description))
                    .col(string_null(Booking::SpecialRequirements))
                    .col(double(Booking::QuotedPrice).not_null())
                    .col(double_null(Booking::FinalPrice))
                    .col(double_null(Booking::PartsCost))
                    .col(
                        ColumnDef::new(Booking::Status)
                            .custom(BookingStatus::Enum)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Booking::Priority)
                            .custom(BookingPriority::Enum)
                            .not_null(),
                    )
                    .col(timestamp_with_time_zone_null(Booking::ScheduledStart))
                    .col(timestamp_with_time_zone_null(Booking::ActualStart))
                    .col(timestamp_with_time_zone_null(Booking::EstimatedCompletion))
                    .col(timestamp_with_time_zone_null(Booking::ActualCompletion))
                    .col(json_binary_null(Booking::Photos))
                    .col(string_null(Booking::InternalNotes))
                    .col(integer_null(Booking::CustomerRating))
                    .col(string_null(Booking::CustomerFeedback))
                    .col(
                        timestamp_with_time_zone(Booking::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Booking::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_customer")
                            .from(Booking::Table, Booking::CustomerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_service_type")
                            .from(Booking::Table, Booking::ServiceTypeId)
                            .to(ServiceType::Table, ServiceType::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_technician")
                            .from(Booking::Table, Booking::TechnicianId)
                            .to(Technician::Table, Technician::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(BookingPriority::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(BookingStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    CustomerId,
    ServiceTypeId,
    TechnicianId,
    CustomerName,
    CustomerPhone,
    CustomerEmail,
    ServiceAddress,
    ServiceLatitude,
    ServiceLongitude,
    PreferredDate,
    Description,
    SpecialRequirements,
    QuotedPrice,
    FinalPrice,
    PartsCost,
    Status,
    Priority,
    ScheduledStart,
    ActualStart,
    EstimatedCompletion,
    ActualCompletion,
    Photos,
    InternalNotes,
    CustomerRating,
    CustomerFeedback,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum BookingStatus {
    #[sea_orm(iden = "booking_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "confirmed")]
    Confirmed,
    #[sea_orm(iden = "technician_assigned")]
    TechnicianAssigned,
    #[sea_orm(iden = "technician_en_route")]
    TechnicianEnRoute,
    #[sea_orm(iden = "in_progress")]
    InProgress,
    #[sea_orm(iden = "completed")]
    Completed,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
    #[sea_orm(iden = "payment_pending")]
    PaymentPending,
    #[sea_orm(iden = "paid")]
    Paid,
}

#[derive(DeriveIden)]
pub enum BookingPriority {
    #[sea_orm(iden = "booking_priority")]
    Enum,
    #[sea_orm(iden = "low")]
    Low,
    #[sea_orm(iden = "normal")]
    Normal,
    #[sea_orm(iden = "high")]
    High,
    #[sea_orm(iden = "emergency")]
    Emergency,
}
