//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider` — unified access to all per-aggregate repositories
//! - `DomainResult` — standard result type for domain operations

use super::booking::BookingRepository;
use super::notification::NotificationPreferenceRepository;
use super::payment::TransactionRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// Consumers request only the repository they need:
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let booking = repos.bookings().find_for_user("user-1", "b-1").await?;
///     let ledger = repos.transactions().list_for_booking("user-1", "b-1").await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn bookings(&self) -> &dyn BookingRepository;
    fn transactions(&self) -> &dyn TransactionRepository;
    fn notification_preferences(&self) -> &dyn NotificationPreferenceRepository;
}
