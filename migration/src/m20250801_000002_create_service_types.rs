use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceType::Table)
                    .if_not_exists()
                    .col(uuid(ServiceType::Id).primary_key())
                    .col(string_len(ServiceType::Name, 100).not_null().unique_key())
                    .col(string_null(ServiceType::Description))
                    .col(double(ServiceType::BasePrice).not_null())
                    .col(string_len_null(ServiceType::RequiredSpecialization, 50))
                    .col(boolean(ServiceType::IsActive).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(ServiceType::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceType::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ServiceType {
    Table,
    Id,
    Name,
    Description,
    BasePrice,
    RequiredSpecialization,
    IsActive,
    CreatedAt,
}
