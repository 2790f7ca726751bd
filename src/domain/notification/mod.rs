//! Notification preferences aggregate

pub mod model;
pub mod repository;

pub use model::{
    ChannelPreferences, FollowUp, NotificationCategory, NotificationPreferences, ReminderOffset,
    ReminderSchedule,
};
pub use repository::NotificationPreferenceRepository;
