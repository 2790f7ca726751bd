//! Create user_notification_preferences table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserNotificationPreferences::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserNotificationPreferences::UserId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserNotificationPreferences::Email)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserNotificationPreferences::Push)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserNotificationPreferences::Sms)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserNotificationPreferences::Reminders)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserNotificationPreferences::UpdatedAt)
                            .timestamp_with_time_zone(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(UserNotificationPreferences::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
pub enum UserNotificationPreferences {
    Table,
    UserId,
    Email,
    Push,
    Sms,
    Reminders,
    UpdatedAt,
}
