use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20250801_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(CertificationLevel::Enum)
                    .values([
                        CertificationLevel::Basic,
                        CertificationLevel::Intermediate,
                        CertificationLevel::Advanced,
                        CertificationLevel::Expert,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Technician::Table)
                    .if_not_exists()
                    .col(uuid(Technician::Id).primary_key())
                    .col(uuid(Technician::UserId).not_null().unique_key())
                    .col(string_len(Technician::EmployeeId, 50).not_null().unique_key())
                    .col(json_binary(Technician::Specializations).not_null())
                    .col(
                        ColumnDef::new(Technician::CertificationLevel)
                            .custom(CertificationLevel::Enum)
                            .not_null(),
                    )
                    .col(double(Technician::HourlyRate).not_null())
                    .col(double(Technician::ServiceRadiusKm).not_null())
                    .col(boolean(Technician::IsAvailable).not_null().default(true))
                    .col(boolean(Technician::IsOnDuty).not_null().default(false))
                    .col(double_null(Technician::CurrentLatitude))
                    .col(double_null(Technician::CurrentLongitude))
                    .col(timestamp_with_time_zone_null(Technician::LastLocationUpdate))
                    .col(double(Technician::Rating).not_null().default(0.0))
                    .col(integer(Technician::TotalJobs).not_null().default(0))
                    .col(integer(Technician::CompletedJobs).not_null().default(0))
                    .col(string_len_null(Technician::Phone, 30))
                    .col(json_binary_null(Technician::VehicleInfo))
                    .col(boolean(Technician::EmergencyCertified).not_null().default(false))
                    .col(
                        timestamp_with_time_zone(Technician::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Technician::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_technician_user")
                            .from(Technician::Table, Technician::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Technician::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(CertificationLevel::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Technician {
    Table,
    Id,
    UserId,
    EmployeeId,
    Specializations,
    CertificationLevel,
    HourlyRate,
    ServiceRadiusKm,
    IsAvailable,
    IsOnDuty,
    CurrentLatitude,
    CurrentLongitude,
    LastLocationUpdate,
    Rating,
    TotalJobs,
    CompletedJobs,
    Phone,
    VehicleInfo,
    EmergencyCertified,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum CertificationLevel {
    #[sea_orm(iden = "certification_level")]
    Enum,
    #[sea_orm(iden = "basic")]
    Basic,
    #[sea_orm(iden = "intermediate")]
    Intermediate,
    #[sea_orm(iden = "advanced")]
    Advanced,
    #[sea_orm(iden = "expert")]
    Expert,
}
