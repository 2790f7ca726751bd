//! Ledger entries for payment-related events

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::DomainResult;
use crate::shared::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Payment,
    Refund,
    Adjustment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Refund => "refund",
            Self::Adjustment => "adjustment",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment" => Ok(Self::Payment),
            "refund" => Ok(Self::Refund),
            "adjustment" => Ok(Self::Adjustment),
            other => Err(DomainError::Validation(format!(
                "unknown transaction type '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// `pending → completed | failed`, `completed → refunded`
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed)
                | (Self::Pending, Self::Failed)
                | (Self::Completed, Self::Refunded)
        )
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(DomainError::Validation(format!(
                "unknown transaction status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human label for a payment method code (`credit-card` → `Credit Card`).
/// Unknown codes are returned unchanged.
pub fn payment_method_label(code: &str) -> String {
    match code {
        "credit-card" | "card" => "Credit Card".to_string(),
        "upi" => "UPI".to_string(),
        "wallet" => "Digital Wallet".to_string(),
        "netbanking" | "net-banking" => "Net Banking".to_string(),
        other => other.to_string(),
    }
}

/// Append-only ledger entry. Only `status` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub booking_id: String,
    pub kind: TransactionType,
    #[schema(value_type = String, example = "46.18")]
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: String,
    /// Reference assigned by the payment provider
    pub provider_id: Option<String>,
    pub status: TransactionStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// New pending payment for a booking
    pub fn payment(
        id: impl Into<String>,
        user_id: impl Into<String>,
        booking_id: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
        payment_method: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let booking_id = booking_id.into();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            description: Some(format!("Payment for booking {}", booking_id)),
            booking_id,
            kind: TransactionType::Payment,
            amount,
            currency: currency.into(),
            payment_method: payment_method.into(),
            provider_id: None,
            status: TransactionStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Completed refund mirroring a completed payment
    pub fn refund_of(id: impl Into<String>, payment: &Transaction, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            user_id: payment.user_id.clone(),
            booking_id: payment.booking_id.clone(),
            kind: TransactionType::Refund,
            amount: payment.amount,
            currency: payment.currency.clone(),
            payment_method: payment.payment_method.clone(),
            provider_id: payment.provider_id.clone(),
            status: TransactionStatus::Completed,
            description: Some(format!("Refund for cancelled booking {}", payment.booking_id)),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn transition_to(&mut self, next: TransactionStatus, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

/// Aggregate view over a user's ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransactionSummary {
    pub count: usize,
    /// Sum of completed payments
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    pub completed: usize,
    pub pending: usize,
    pub failed: usize,
    pub refunded: usize,
    /// Amount per transaction type
    #[schema(value_type = BTreeMap<String, String>)]
    pub by_type: BTreeMap<String, Decimal>,
}

impl TransactionSummary {
    pub fn from_ledger(transactions: &[Transaction]) -> Self {
        let mut summary = Self {
            count: transactions.len(),
            ..Self::default()
        };
        for tx in transactions {
            match tx.status {
                TransactionStatus::Completed => summary.completed += 1,
                TransactionStatus::Pending => summary.pending += 1,
                TransactionStatus::Failed => summary.failed += 1,
                TransactionStatus::Refunded => summary.refunded += 1,
            }
            if tx.kind == TransactionType::Payment && tx.status == TransactionStatus::Completed {
                summary.total_amount += tx.amount;
            }
            *summary
                .by_type
                .entry(tx.kind.as_str().to_string())
                .or_insert(Decimal::ZERO) += tx.amount;
        }
        summary
    }
}
