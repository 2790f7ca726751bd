//! Email transports

mod logging;
mod resend;

pub use logging::LoggingEmailSender;
pub use resend::ResendEmailSender;

use std::sync::Arc;

use crate::application::ports::EmailSender;
use crate::config::EmailConfig;
use crate::shared::errors::InfraError;

/// Resend when an API key is configured, otherwise the logging sender.
pub fn sender_from_config(config: &EmailConfig) -> Result<Arc<dyn EmailSender>, InfraError> {
    match config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(key) => Ok(Arc::new(ResendEmailSender::new(
            &config.base_url,
            key,
            &config.from,
        )?)),
        None => {
            tracing::warn!("Email API key not configured, emails will only be logged");
            Ok(Arc::new(LoggingEmailSender))
        }
    }
}
