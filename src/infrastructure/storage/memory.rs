//! In-memory repository provider
//!
//! Backs `driver = "memory"` and the service tests. Nothing survives a
//! restart.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::booking::{Booking, BookingRepository, BookingStatus};
use crate::domain::notification::{NotificationPreferenceRepository, NotificationPreferences};
use crate::domain::payment::{Transaction, TransactionRepository, TransactionStatus};
use crate::domain::repositories::RepositoryProvider;
use crate::domain::{DomainError, DomainResult};

/// Row plus insertion sequence, used as the tie-breaker for equal timestamps
struct Row<T> {
    seq: u64,
    value: T,
}

#[derive(Default)]
pub struct InMemoryBookingRepository {
    rows: DashMap<String, Row<Booking>>,
    seq: AtomicU64,
}

impl InMemoryBookingRepository {
    fn newest_first(&self, keep: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        let mut rows: Vec<(u64, Booking)> = self
            .rows
            .iter()
            .filter(|r| keep(&r.value))
            .map(|r| (r.seq, r.value.clone()))
            .collect();
        rows.sort_by(|(sa, a), (sb, b)| b.created_at.cmp(&a.created_at).then(sb.cmp(sa)));
        rows.into_iter().map(|(_, b)| b).collect()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert(&self, booking: Booking) -> DomainResult<()> {
        if self.rows.contains_key(&booking.id) {
            return Err(DomainError::Conflict(format!(
                "booking {} already exists",
                booking.id
            )));
        }
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.rows.insert(booking.id.clone(), Row { seq, value: booking });
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Booking>> {
        Ok(self.rows.get(id).map(|r| r.value.clone()))
    }

    async fn find_for_user(&self, user_id: &str, id: &str) -> DomainResult<Option<Booking>> {
        Ok(self
            .rows
            .get(id)
            .filter(|r| r.value.is_owned_by(user_id))
            .map(|r| r.value.clone()))
    }

    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<Booking>> {
        Ok(self.newest_first(|b| b.is_owned_by(user_id)))
    }

    async fn list_for_user_by_status(
        &self,
        user_id: &str,
        status: BookingStatus,
    ) -> DomainResult<Vec<Booking>> {
        Ok(self.newest_first(|b| b.is_owned_by(user_id) && b.status == status))
    }

    async fn update(&self, booking: Booking) -> DomainResult<Booking> {
        let mut row = self
            .rows
            .get_mut(&booking.id)
            .ok_or_else(|| DomainError::not_found("Booking", "id", &booking.id))?;
        if row.value.version != booking.version {
            return Err(DomainError::Conflict(format!(
                "booking {} was modified concurrently (version {} != {})",
                booking.id, booking.version, row.value.version
            )));
        }
        let mut stored = booking;
        stored.version += 1;
        row.value = stored.clone();
        Ok(stored)
    }
}

#[derive(Default)]
pub struct InMemoryTransactionRepository {
    rows: DashMap<String, Row<Transaction>>,
    seq: AtomicU64,
}

impl InMemoryTransactionRepository {
    fn ordered(&self, keep: impl Fn(&Transaction) -> bool, newest_first: bool) -> Vec<Transaction> {
        let mut rows: Vec<(u64, Transaction)> = self
            .rows
            .iter()
            .filter(|r| keep(&r.value))
            .map(|r| (r.seq, r.value.clone()))
            .collect();
        rows.sort_by(|(sa, a), (sb, b)| a.created_at.cmp(&b.created_at).then(sa.cmp(sb)));
        if newest_first {
            rows.reverse();
        }
        rows.into_iter().map(|(_, t)| t).collect()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn insert(&self, transaction: Transaction) -> DomainResult<()> {
        if self.rows.contains_key(&transaction.id) {
            return Err(DomainError::Conflict(format!(
                "transaction {} already exists",
                transaction.id
            )));
        }
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.rows.insert(
            transaction.id.clone(),
            Row {
                seq,
                value: transaction,
            },
        );
        Ok(())
    }

    async fn find_for_user(&self, user_id: &str, id: &str) -> DomainResult<Option<Transaction>> {
        Ok(self
            .rows
            .get(id)
            .filter(|r| r.value.user_id == user_id)
            .map(|r| r.value.clone()))
    }

    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<Transaction>> {
        Ok(self.ordered(|t| t.user_id == user_id, true))
    }

    async fn list_for_user_by_status(
        &self,
        user_id: &str,
        status: TransactionStatus,
    ) -> DomainResult<Vec<Transaction>> {
        Ok(self.ordered(|t| t.user_id == user_id && t.status == status, true))
    }

    async fn list_for_booking(
        &self,
        user_id: &str,
        booking_id: &str,
    ) -> DomainResult<Vec<Transaction>> {
        Ok(self.ordered(
            |t| t.user_id == user_id && t.booking_id == booking_id,
            false,
        ))
    }

    async fn update_status(&self, transaction: &Transaction) -> DomainResult<()> {
        let mut row = self
            .rows
            .get_mut(&transaction.id)
            .filter(|r| r.value.user_id == transaction.user_id)
            .ok_or_else(|| DomainError::not_found("Transaction", "id", &transaction.id))?;
        row.value.status = transaction.status;
        row.value.updated_at = transaction.updated_at;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryNotificationPreferenceRepository {
    rows: DashMap<String, NotificationPreferences>,
}

#[async_trait]
impl NotificationPreferenceRepository for InMemoryNotificationPreferenceRepository {
    async fn find(&self, user_id: &str) -> DomainResult<Option<NotificationPreferences>> {
        Ok(self.rows.get(user_id).map(|p| p.clone()))
    }

    async fn upsert(&self, preferences: NotificationPreferences) -> DomainResult<()> {
        self.rows.insert(preferences.user_id.clone(), preferences);
        Ok(())
    }
}

/// DashMap-backed `RepositoryProvider`
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    bookings: InMemoryBookingRepository,
    transactions: InMemoryTransactionRepository,
    preferences: InMemoryNotificationPreferenceRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }

    fn transactions(&self) -> &dyn TransactionRepository {
        &self.transactions
    }

    fn notification_preferences(&self) -> &dyn NotificationPreferenceRepository {
        &self.preferences
    }
}
