//! Booking repository interface
//!
//! Every user-scoped lookup takes the owning `user_id`. A booking owned by
//! someone else is indistinguishable from a missing one.

use async_trait::async_trait;

use super::model::{Booking, BookingStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Persist a new booking. Nothing is written when this fails.
    async fn insert(&self, booking: Booking) -> DomainResult<()>;

    /// Find by id regardless of owner (background workers only)
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Booking>>;

    /// Find by id, scoped to the owning user
    async fn find_for_user(&self, user_id: &str, id: &str) -> DomainResult<Option<Booking>>;

    /// All bookings of a user, newest first
    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<Booking>>;

    /// Bookings of a user in the given status, newest first
    async fn list_for_user_by_status(
        &self,
        user_id: &str,
        status: BookingStatus,
    ) -> DomainResult<Vec<Booking>>;

    /// Write back a modified booking.
    ///
    /// `booking.version` must equal the stored version, otherwise
    /// `DomainError::Conflict` is returned and nothing is written.
    /// Returns the stored booking with its version incremented.
    async fn update(&self, booking: Booking) -> DomainResult<Booking>;
}
