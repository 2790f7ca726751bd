//! Notification preference repository interface

use async_trait::async_trait;

use super::model::NotificationPreferences;
use crate::domain::DomainResult;

#[async_trait]
pub trait NotificationPreferenceRepository: Send + Sync {
    /// Stored preferences, `None` until the user saves once
    async fn find(&self, user_id: &str) -> DomainResult<Option<NotificationPreferences>>;

    /// Insert or replace the user's preferences
    async fn upsert(&self, preferences: NotificationPreferences) -> DomainResult<()>;
}
