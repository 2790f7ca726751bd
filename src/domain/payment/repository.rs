//! Transaction repository interface

use async_trait::async_trait;

use super::model::{Transaction, TransactionStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn insert(&self, transaction: Transaction) -> DomainResult<()>;

    async fn find_for_user(&self, user_id: &str, id: &str) -> DomainResult<Option<Transaction>>;

    /// Ledger of a user, newest first
    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<Transaction>>;

    async fn list_for_user_by_status(
        &self,
        user_id: &str,
        status: TransactionStatus,
    ) -> DomainResult<Vec<Transaction>>;

    /// Entries referencing one booking, oldest first
    async fn list_for_booking(
        &self,
        user_id: &str,
        booking_id: &str,
    ) -> DomainResult<Vec<Transaction>>;

    /// Persist a status change made through `Transaction::transition_to`
    async fn update_status(&self, transaction: &Transaction) -> DomainResult<()>;
}
