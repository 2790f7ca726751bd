//! SeaORM implementation of NotificationPreferenceRepository

use async_trait::async_trait;
use log::debug;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};

use super::db_err;
use crate::domain::notification::{NotificationPreferenceRepository, NotificationPreferences};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::notification_preference;

pub struct SeaOrmNotificationPreferenceRepository {
    db: DatabaseConnection,
}

impl SeaOrmNotificationPreferenceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn json_err(e: serde_json::Error) -> DomainError {
    DomainError::Persistence(format!("invalid preference json: {}", e))
}

fn model_to_domain(m: notification_preference::Model) -> DomainResult<NotificationPreferences> {
    Ok(NotificationPreferences {
        email: serde_json::from_str(&m.email).map_err(json_err)?,
        push: serde_json::from_str(&m.push).map_err(json_err)?,
        sms: serde_json::from_str(&m.sms).map_err(json_err)?,
        reminders: serde_json::from_str(&m.reminders).map_err(json_err)?,
        user_id: m.user_id,
        updated_at: m.updated_at,
    })
}

#[async_trait]
impl NotificationPreferenceRepository for SeaOrmNotificationPreferenceRepository {
    async fn find(&self, user_id: &str) -> DomainResult<Option<NotificationPreferences>> {
        notification_preference::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn upsert(&self, p: NotificationPreferences) -> DomainResult<()> {
        debug!("Saving notification preferences for {}", p.user_id);

        let model = notification_preference::ActiveModel {
            email: Set(serde_json::to_string(&p.email).map_err(json_err)?),
            push: Set(serde_json::to_string(&p.push).map_err(json_err)?),
            sms: Set(serde_json::to_string(&p.sms).map_err(json_err)?),
            reminders: Set(serde_json::to_string(&p.reminders).map_err(json_err)?),
            user_id: Set(p.user_id),
            updated_at: Set(p.updated_at),
        };

        notification_preference::Entity::insert(model)
            .on_conflict(
                OnConflict::column(notification_preference::Column::UserId)
                    .update_columns([
                        notification_preference::Column::Email,
                        notification_preference::Column::Push,
                        notification_preference::Column::Sms,
                        notification_preference::Column::Reminders,
                        notification_preference::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::ReminderOffset;
    use crate::infrastructure::database::test_support::memory_db;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn missing_until_first_save() {
        let repo = SeaOrmNotificationPreferenceRepository::new(memory_db().await);
        assert!(repo.find("user-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_whole_record() {
        let repo = SeaOrmNotificationPreferenceRepository::new(memory_db().await);
        repo.upsert(NotificationPreferences::defaults_for("user-1"))
            .await
            .unwrap();

        let mut changed = NotificationPreferences::defaults_for("user-1");
        changed.email.promotions = true;
        changed.reminders.before = vec![ReminderOffset::Minutes30];
        changed.updated_at = Some(Utc.with_ymd_and_hms(2025, 9, 16, 8, 0, 0).unwrap());
        repo.upsert(changed.clone()).await.unwrap();

        let loaded = repo.find("user-1").await.unwrap().unwrap();
        assert_eq!(loaded, changed);
        assert!(repo.find("user-2").await.unwrap().is_none());
    }
}
