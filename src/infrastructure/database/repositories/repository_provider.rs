//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::booking::BookingRepository;
use crate::domain::notification::NotificationPreferenceRepository;
use crate::domain::payment::TransactionRepository;
use crate::domain::repositories::RepositoryProvider;

use super::booking_repository::SeaOrmBookingRepository;
use super::notification_preference_repository::SeaOrmNotificationPreferenceRepository;
use super::transaction_repository::SeaOrmTransactionRepository;

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let booking = repos.bookings().find_for_user("user-1", "b-1").await?;
/// let ledger = repos.transactions().list_for_booking("user-1", "b-1").await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    bookings: SeaOrmBookingRepository,
    transactions: SeaOrmTransactionRepository,
    notification_preferences: SeaOrmNotificationPreferenceRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            bookings: SeaOrmBookingRepository::new(db.clone()),
            transactions: SeaOrmTransactionRepository::new(db.clone()),
            notification_preferences: SeaOrmNotificationPreferenceRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }

    fn transactions(&self) -> &dyn TransactionRepository {
        &self.transactions
    }

    fn notification_preferences(&self) -> &dyn NotificationPreferenceRepository {
        &self.notification_preferences
    }
}
