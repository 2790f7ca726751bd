use async_trait::async_trait;
use tracing::info;

use crate::application::ports::{EmailMessage, EmailSender, SendReceipt};
use crate::domain::DomainResult;

/// Stand-in transport that only records the message in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEmailSender;

#[async_trait]
impl EmailSender for LoggingEmailSender {
    async fn send(&self, message: &EmailMessage) -> DomainResult<SendReceipt> {
        info!(to = %message.to, subject = %message.subject, "📧 Email (not sent, no transport configured)");
        Ok(SendReceipt::Logged)
    }
}
