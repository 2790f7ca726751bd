pub mod booking;
pub mod events;
pub mod geo;
pub mod notification;
pub mod payment;
pub mod repositories;
pub mod station;
pub mod user;

// Re-export commonly used types
pub use booking::{Booking, BookingStatus, ChargeDuration, PriceBreakdown, PricingPolicy, Schedule};
pub use geo::Coordinate;
pub use notification::NotificationPreferences;
pub use payment::{Transaction, TransactionStatus, TransactionType};
pub use repositories::{DomainResult, RepositoryProvider};
pub use station::{Slot, Station, StationStatus};
pub use user::UserProfile;

pub use crate::shared::errors::DomainError;
