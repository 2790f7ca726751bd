//! Create bookings table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::UserId).string().not_null())
                    .col(ColumnDef::new(Bookings::StationId).string().not_null())
                    .col(ColumnDef::new(Bookings::StationName).string().not_null())
                    .col(ColumnDef::new(Bookings::StationAddress).string().not_null())
                    .col(ColumnDef::new(Bookings::StationImage).string())
                    .col(ColumnDef::new(Bookings::StationLatitude).double())
                    .col(ColumnDef::new(Bookings::StationLongitude).double())
                    .col(ColumnDef::new(Bookings::SlotId).string().not_null())
                    .col(ColumnDef::new(Bookings::ConnectorType).string().not_null())
                    .col(ColumnDef::new(Bookings::PowerKw).string().not_null())
                    .col(ColumnDef::new(Bookings::Date).date().not_null())
                    .col(ColumnDef::new(Bookings::StartTime).date_time().not_null())
                    .col(ColumnDef::new(Bookings::EndTime).date_time().not_null())
                    .col(
                        ColumnDef::new(Bookings::DurationMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::Rate).string().not_null())
                    .col(ColumnDef::new(Bookings::EnergyKwh).string().not_null())
                    .col(ColumnDef::new(Bookings::EnergyCost).string().not_null())
                    .col(ColumnDef::new(Bookings::PlatformFee).string().not_null())
                    .col(ColumnDef::new(Bookings::Taxes).string().not_null())
                    .col(ColumnDef::new(Bookings::Total).string().not_null())
                    .col(ColumnDef::new(Bookings::PaymentMethod).string().not_null())
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string()
                            .not_null()
                            .default("confirmed"),
                    )
                    .col(ColumnDef::new(Bookings::QrCode).text())
                    .col(ColumnDef::new(Bookings::ActualDurationMinutes).integer())
                    .col(ColumnDef::new(Bookings::EnergyDeliveredKwh).string())
                    .col(ColumnDef::new(Bookings::ActualCost).string())
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::CompletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Bookings::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_user")
                    .table(Bookings::Table)
                    .col(Bookings::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bookings_user_status")
                    .table(Bookings::Table)
                    .col(Bookings::UserId)
                    .col(Bookings::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Bookings {
    Table,
    Id,
    UserId,
    StationId,
    StationName,
    StationAddress,
    StationImage,
    StationLatitude,
    StationLongitude,
    SlotId,
    ConnectorType,
    PowerKw,
    Date,
    StartTime,
    EndTime,
    DurationMinutes,
    Rate,
    EnergyKwh,
    EnergyCost,
    PlatformFee,
    Taxes,
    Total,
    PaymentMethod,
    Status,
    QrCode,
    ActualDurationMinutes,
    EnergyDeliveredKwh,
    ActualCost,
    CreatedAt,
    UpdatedAt,
    CompletedAt,
    Version,
}
