//! Outbound ports — interfaces for delivering messages to users
//!
//! [`EmailSender`] decouples the notification service from the transport.
//! Production uses the Resend HTTP API; when no API key is configured a
//! logging sender stands in so the caller never has to special-case it.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::DomainResult;

/// Fully rendered email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Outcome reported by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendReceipt {
    /// Accepted by the provider, with its message id when returned
    Delivered { provider_id: Option<String> },
    /// No transport configured; the message was only logged
    Logged,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> DomainResult<SendReceipt>;
}
