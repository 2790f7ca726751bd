//! Payment ledger service
//!
//! Records one transaction per payment attempt and appends refunds.
//! Ledger failures never invalidate the booking they belong to; callers
//! decide whether to surface them.

use std::sync::Arc;

use chrono::Utc;
use log::{info, warn};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::application::events::{Event, PaymentRecordedEvent, SharedEventBus};
use crate::domain::booking::Booking;
use crate::domain::payment::{Transaction, TransactionStatus, TransactionSummary, TransactionType};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

/// Result reported by the payment step of checkout
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PaymentOutcome {
    Completed { provider_id: Option<String> },
    Failed { reason: String },
    Pending,
}

impl Default for PaymentOutcome {
    fn default() -> Self {
        Self::Completed { provider_id: None }
    }
}

pub struct PaymentService {
    repos: Arc<dyn RepositoryProvider>,
    events: SharedEventBus,
    currency: String,
}

impl PaymentService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, events: SharedEventBus, currency: impl Into<String>) -> Self {
        Self {
            repos,
            events,
            currency: currency.into(),
        }
    }

    /// Log the payment attempt for `booking`. The entry is created pending
    /// and moved to the reported outcome before it is stored.
    pub async fn record_payment(&self, booking: &Booking, outcome: PaymentOutcome) -> DomainResult<Transaction> {
        let now = Utc::now();
        let mut tx = Transaction::payment(
            uuid::Uuid::new_v4().to_string(),
            &booking.user_id,
            &booking.id,
            booking.total(),
            &self.currency,
            &booking.payment_method,
            now,
        );
        match outcome {
            PaymentOutcome::Completed { provider_id } => {
                tx.provider_id = provider_id;
                tx.transition_to(TransactionStatus::Completed, now)?;
            }
            PaymentOutcome::Failed { reason } => {
                tx.transition_to(TransactionStatus::Failed, now)?;
                tx.description = Some(format!("Payment for booking {} failed: {}", booking.id, reason));
            }
            PaymentOutcome::Pending => {}
        }

        self.repos.transactions().insert(tx.clone()).await?;
        metrics::counter!("payments_recorded_total", "status" => tx.status.as_str()).increment(1);
        info!(
            "Transaction {} recorded for booking {} ({} {}, {})",
            tx.id, tx.booking_id, tx.amount, tx.currency, tx.status
        );
        self.publish(&tx);
        Ok(tx)
    }

    fn publish(&self, tx: &Transaction) {
        self.events.publish(Event::PaymentRecorded(PaymentRecordedEvent {
            transaction_id: tx.id.clone(),
            booking_id: tx.booking_id.clone(),
            user_id: tx.user_id.clone(),
            status: tx.status.to_string(),
            timestamp: tx.updated_at,
        }));
    }

    /// Move a transaction along `pending → completed|failed` or `completed → refunded`
    pub async fn update_status(
        &self,
        user_id: &str,
        transaction_id: &str,
        next: TransactionStatus,
    ) -> DomainResult<Transaction> {
        let mut tx = self.get(user_id, transaction_id).await?;
        tx.transition_to(next, Utc::now())?;
        self.repos.transactions().update_status(&tx).await?;
        metrics::counter!("payments_recorded_total", "status" => tx.status.as_str()).increment(1);
        self.publish(&tx);
        Ok(tx)
    }

    /// Append a refund for the booking's completed payment, if there is one.
    ///
    /// Returns `None` when nothing was paid or a refund already exists.
    pub async fn refund_booking(&self, user_id: &str, booking_id: &str) -> DomainResult<Option<Transaction>> {
        let ledger = self.repos.transactions().list_for_booking(user_id, booking_id).await?;
        if ledger.iter().any(|t| t.kind == TransactionType::Refund) {
            return Ok(None);
        }
        let Some(mut payment) = ledger
            .into_iter()
            .find(|t| t.kind == TransactionType::Payment && t.status == TransactionStatus::Completed)
        else {
            return Ok(None);
        };

        let now = Utc::now();
        let refund = Transaction::refund_of(uuid::Uuid::new_v4().to_string(), &payment, now);
        self.repos.transactions().insert(refund.clone()).await?;

        payment.transition_to(TransactionStatus::Refunded, now)?;
        if let Err(e) = self.repos.transactions().update_status(&payment).await {
            warn!("Refund {} stored but payment {} not marked refunded: {}", refund.id, payment.id, e);
        }

        info!("Refund {} recorded for booking {} ({})", refund.id, booking_id, refund.amount);
        self.publish(&refund);
        Ok(Some(refund))
    }

    pub async fn get(&self, user_id: &str, transaction_id: &str) -> DomainResult<Transaction> {
        self.repos
            .transactions()
            .find_for_user(user_id, transaction_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Transaction", "id", transaction_id))
    }

    /// Newest first
    pub async fn list(&self, user_id: &str, status: Option<TransactionStatus>) -> DomainResult<Vec<Transaction>> {
        match status {
            Some(status) => self.repos.transactions().list_for_user_by_status(user_id, status).await,
            None => self.repos.transactions().list_for_user(user_id).await,
        }
    }

    /// Oldest first
    pub async fn for_booking(&self, user_id: &str, booking_id: &str) -> DomainResult<Vec<Transaction>> {
        self.repos.transactions().list_for_booking(user_id, booking_id).await
    }

    pub async fn summary(&self, user_id: &str) -> DomainResult<TransactionSummary> {
        let ledger = self.repos.transactions().list_for_user(user_id).await?;
        Ok(TransactionSummary::from_ledger(&ledger))
    }
}
