//! Per-user notification preferences

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::errors::DomainError;

/// Notification category a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Confirmation,
    Reminders,
    Updates,
    Promotions,
}

/// Flags for one delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChannelPreferences {
    pub enabled: bool,
    pub confirmation: bool,
    pub reminders: bool,
    pub updates: bool,
    pub promotions: bool,
}

impl ChannelPreferences {
    /// Transactional categories on, marketing off
    pub const fn standard() -> Self {
        Self {
            enabled: true,
            confirmation: true,
            reminders: true,
            updates: true,
            promotions: false,
        }
    }

    pub const fn reminders_only() -> Self {
        Self {
            enabled: true,
            confirmation: false,
            reminders: true,
            updates: false,
            promotions: false,
        }
    }

    pub fn allows(&self, category: NotificationCategory) -> bool {
        self.enabled
            && match category {
                NotificationCategory::Confirmation => self.confirmation,
                NotificationCategory::Reminders => self.reminders,
                NotificationCategory::Updates => self.updates,
                NotificationCategory::Promotions => self.promotions,
            }
    }
}

/// How long before the session a reminder goes out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ReminderOffset {
    #[serde(rename = "24h")]
    Hours24,
    #[serde(rename = "12h")]
    Hours12,
    #[serde(rename = "2h")]
    Hours2,
    #[serde(rename = "30m")]
    Minutes30,
}

impl ReminderOffset {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Hours24 => "24h",
            Self::Hours12 => "12h",
            Self::Hours2 => "2h",
            Self::Minutes30 => "30m",
        }
    }

    /// Wording used in reminder emails
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hours24 => "24 hours",
            Self::Hours12 => "12 hours",
            Self::Hours2 => "2 hours",
            Self::Minutes30 => "30 minutes",
        }
    }

    pub fn lead_time(&self) -> Duration {
        match self {
            Self::Hours24 => Duration::hours(24),
            Self::Hours12 => Duration::hours(12),
            Self::Hours2 => Duration::hours(2),
            Self::Minutes30 => Duration::minutes(30),
        }
    }
}

impl std::str::FromStr for ReminderOffset {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(Self::Hours24),
            "12h" => Ok(Self::Hours12),
            "2h" => Ok(Self::Hours2),
            "30m" => Ok(Self::Minutes30),
            other => Err(DomainError::Validation(format!(
                "unknown reminder offset '{}'",
                other
            ))),
        }
    }
}

/// Messages sent after a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FollowUp {
    Completion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReminderSchedule {
    pub before: Vec<ReminderOffset>,
    pub after: Vec<FollowUp>,
}

impl Default for ReminderSchedule {
    fn default() -> Self {
        Self {
            before: vec![ReminderOffset::Hours24, ReminderOffset::Hours2],
            after: vec![FollowUp::Completion],
        }
    }
}

/// Stored preferences; replaced wholesale on save, no history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NotificationPreferences {
    pub user_id: String,
    pub email: ChannelPreferences,
    pub push: ChannelPreferences,
    pub sms: ChannelPreferences,
    pub reminders: ReminderSchedule,
    pub updated_at: Option<DateTime<Utc>>,
}

impl NotificationPreferences {
    /// Preferences a user has before saving any
    pub fn defaults_for(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: ChannelPreferences::standard(),
            push: ChannelPreferences::standard(),
            sms: ChannelPreferences::reminders_only(),
            reminders: ReminderSchedule::default(),
            updated_at: None,
        }
    }

    pub fn email_allows(&self, category: NotificationCategory) -> bool {
        self.email.allows(category)
    }

    pub fn wants_reminder(&self, offset: ReminderOffset) -> bool {
        self.email_allows(NotificationCategory::Reminders) && self.reminders.before.contains(&offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_access() {
        let prefs = NotificationPreferences::defaults_for("user-1");
        assert!(prefs.email_allows(NotificationCategory::Confirmation));
        assert!(prefs.email_allows(NotificationCategory::Reminders));
        assert!(!prefs.email_allows(NotificationCategory::Promotions));
        assert!(prefs.push.updates);
        assert!(prefs.sms.reminders);
        assert!(!prefs.sms.confirmation);
        assert_eq!(
            prefs.reminders.before,
            vec![ReminderOffset::Hours24, ReminderOffset::Hours2]
        );
        assert_eq!(prefs.reminders.after, vec![FollowUp::Completion]);
        assert!(prefs.updated_at.is_none());
    }

    #[test]
    fn disabled_channel_blocks_every_category() {
        let mut prefs = NotificationPreferences::defaults_for("user-1");
        prefs.email.enabled = false;
        assert!(!prefs.email_allows(NotificationCategory::Confirmation));
        assert!(!prefs.wants_reminder(ReminderOffset::Hours24));
    }

    #[test]
    fn reminder_requires_selected_offset() {
        let prefs = NotificationPreferences::defaults_for("user-1");
        assert!(prefs.wants_reminder(ReminderOffset::Hours2));
        assert!(!prefs.wants_reminder(ReminderOffset::Minutes30));
    }

    #[test]
    fn offsets_serialize_as_codes() {
        let json = serde_json::to_string(&ReminderSchedule::default()).unwrap();
        assert_eq!(json, r#"{"before":["24h","2h"],"after":["completion"]}"#);
        assert_eq!("30m".parse::<ReminderOffset>().unwrap().label(), "30 minutes");
        assert_eq!(ReminderOffset::Hours12.lead_time(), Duration::hours(12));
    }
}
