//! Notification preferences and email dispatch

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};

use crate::application::artifacts::{confirmation_email, reminder_email};
use crate::application::ports::{EmailMessage, EmailSender, SendReceipt};
use crate::config::EmailConfig;
use crate::domain::booking::Booking;
use crate::domain::notification::{NotificationCategory, NotificationPreferences, ReminderOffset};
use crate::domain::user::UserProfile;
use crate::domain::{DomainResult, RepositoryProvider};

/// What happened to one notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Sent,
    /// No email transport configured; logged only
    Logged,
    Skipped(&'static str),
}

pub struct NotificationService {
    repos: Arc<dyn RepositoryProvider>,
    sender: Arc<dyn EmailSender>,
    app_base_url: String,
    currency: String,
}

impl NotificationService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        sender: Arc<dyn EmailSender>,
        email: &EmailConfig,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            repos,
            sender,
            app_base_url: email.app_base_url.clone(),
            currency: currency.into(),
        }
    }

    /// Stored preferences, created with defaults on first access
    pub async fn preferences(&self, user_id: &str) -> DomainResult<NotificationPreferences> {
        if let Some(prefs) = self.repos.notification_preferences().find(user_id).await? {
            return Ok(prefs);
        }
        let mut prefs = NotificationPreferences::defaults_for(user_id);
        prefs.updated_at = Some(Utc::now());
        self.repos.notification_preferences().upsert(prefs.clone()).await?;
        debug!("Created default notification preferences for {}", user_id);
        Ok(prefs)
    }

    /// Replace the user's preferences wholesale
    pub async fn save_preferences(
        &self,
        user_id: &str,
        mut prefs: NotificationPreferences,
    ) -> DomainResult<NotificationPreferences> {
        prefs.user_id = user_id.to_string();
        prefs.updated_at = Some(Utc::now());
        self.repos.notification_preferences().upsert(prefs.clone()).await?;
        info!("Notification preferences saved for {}", user_id);
        Ok(prefs)
    }

    async fn deliver(&self, message: &EmailMessage, booking_id: &str) -> DomainResult<Dispatch> {
        match self.sender.send(message).await {
            Ok(SendReceipt::Delivered { provider_id }) => {
                metrics::counter!("notifications_sent_total").increment(1);
                info!(
                    "Email '{}' sent for booking {} (provider id {:?})",
                    message.subject, booking_id, provider_id
                );
                Ok(Dispatch::Sent)
            }
            Ok(SendReceipt::Logged) => Ok(Dispatch::Logged),
            Err(e) => {
                metrics::counter!("notifications_failed_total").increment(1);
                warn!("Email '{}' for booking {} failed: {}", message.subject, booking_id, e);
                Err(e)
            }
        }
    }

    /// Confirmation email, gated on the email channel, the confirmation
    /// category and the user having an address.
    pub async fn send_confirmation(&self, booking: &Booking, user: &UserProfile) -> DomainResult<Dispatch> {
        let prefs = self.preferences(&user.id).await?;
        if !prefs.email_allows(NotificationCategory::Confirmation) {
            return Ok(Dispatch::Skipped("confirmation emails disabled"));
        }
        let Some(to) = user.email.as_deref() else {
            return Ok(Dispatch::Skipped("no email address"));
        };
        let message = confirmation_email(booking, to, &self.app_base_url, &self.currency);
        self.deliver(&message, &booking.id).await
    }

    /// Reminder email for one offset, gated on the reminders category and
    /// the offset being among the user's chosen ones.
    pub async fn send_reminder(
        &self,
        booking: &Booking,
        user: &UserProfile,
        offset: ReminderOffset,
    ) -> DomainResult<Dispatch> {
        let prefs = self.preferences(&user.id).await?;
        if !prefs.wants_reminder(offset) {
            return Ok(Dispatch::Skipped("reminder not wanted"));
        }
        let Some(to) = user.email.as_deref() else {
            return Ok(Dispatch::Skipped("no email address"));
        };
        let message = reminder_email(booking, offset, to, &self.app_base_url);
        self.deliver(&message, &booking.id).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSender;
    use super::*;
    use crate::domain::booking::model::fixtures;
    use crate::domain::DomainError;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    fn service(sender: Arc<RecordingSender>) -> NotificationService {
        NotificationService::new(
            Arc::new(InMemoryRepositoryProvider::new()),
            sender,
            &EmailConfig::default(),
            "USD",
        )
    }

    fn user_with_email() -> UserProfile {
        let mut user = UserProfile::new("user-1");
        user.email = Some("meera@example.com".into());
        user
    }

    #[tokio::test]
    async fn defaults_created_on_first_access() {
        let svc = service(Arc::new(RecordingSender::default()));
        let prefs = svc.preferences("user-1").await.unwrap();
        assert!(prefs.email.confirmation);
        assert!(prefs.updated_at.is_some());
        assert_eq!(svc.preferences("user-1").await.unwrap(), prefs);
    }

    #[tokio::test]
    async fn save_replaces_wholesale_and_pins_owner() {
        let svc = service(Arc::new(RecordingSender::default()));
        let mut prefs = NotificationPreferences::defaults_for("someone-else");
        prefs.email.promotions = true;
        prefs.reminders.before = vec![ReminderOffset::Minutes30];

        let saved = svc.save_preferences("user-1", prefs).await.unwrap();
        assert_eq!(saved.user_id, "user-1");
        let loaded = svc.preferences("user-1").await.unwrap();
        assert!(loaded.email.promotions);
        assert_eq!(loaded.reminders.before, vec![ReminderOffset::Minutes30]);
    }

    #[tokio::test]
    async fn confirmation_sent_when_allowed() {
        let sender = Arc::new(RecordingSender::default());
        let svc = service(sender.clone());
        let booking = fixtures::booking("b-1", "user-1");

        let outcome = svc.send_confirmation(&booking, &user_with_email()).await.unwrap();
        assert_eq!(outcome, Dispatch::Sent);
        assert_eq!(sender.subjects(), vec!["Booking Confirmed - Phoenix Marketcity"]);
    }

    #[tokio::test]
    async fn confirmation_skipped_without_address_or_flag() {
        let sender = Arc::new(RecordingSender::default());
        let svc = service(sender.clone());
        let booking = fixtures::booking("b-1", "user-1");

        let outcome = svc
            .send_confirmation(&booking, &UserProfile::new("user-1"))
            .await
            .unwrap();
        assert_eq!(outcome, Dispatch::Skipped("no email address"));

        let mut prefs = NotificationPreferences::defaults_for("user-1");
        prefs.email.enabled = false;
        svc.save_preferences("user-1", prefs).await.unwrap();
        let outcome = svc.send_confirmation(&booking, &user_with_email()).await.unwrap();
        assert!(matches!(outcome, Dispatch::Skipped(_)));
        assert!(sender.subjects().is_empty());
    }

    #[tokio::test]
    async fn reminder_only_for_chosen_offsets() {
        let sender = Arc::new(RecordingSender::default());
        let svc = service(sender.clone());
        let booking = fixtures::booking("b-1", "user-1");
        let user = user_with_email();

        let skipped = svc
            .send_reminder(&booking, &user, ReminderOffset::Minutes30)
            .await
            .unwrap();
        assert!(matches!(skipped, Dispatch::Skipped(_)));

        let sent = svc.send_reminder(&booking, &user, ReminderOffset::Hours2).await.unwrap();
        assert_eq!(sent, Dispatch::Sent);
        assert_eq!(
            sender.subjects(),
            vec!["Reminder: Your charging session starts in 2 hours"]
        );
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let sender = Arc::new(RecordingSender {
            fail: true,
            ..RecordingSender::default()
        });
        let svc = service(sender);
        let booking = fixtures::booking("b-1", "user-1");
        let err = svc
            .send_confirmation(&booking, &user_with_email())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::UpstreamUnavailable(_)));
    }
}
