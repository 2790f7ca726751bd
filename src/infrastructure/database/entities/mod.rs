//! Database entities module

pub mod booking;
pub mod notification_preference;
pub mod transaction;

pub use booking::Entity as Booking;
pub use notification_preference::Entity as NotificationPreference;
pub use transaction::Entity as Transaction;
