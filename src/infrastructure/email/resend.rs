//! Resend HTTP API transport
//!
//! `POST {base_url}/emails` with a bearer key. The response carries the
//! provider's message id.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::ports::{EmailMessage, EmailSender, SendReceipt};
use crate::domain::{DomainError, DomainResult};
use crate::shared::errors::InfraError;

const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}

pub struct ResendEmailSender {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl ResendEmailSender {
    pub fn new(base_url: &str, api_key: &str, from: &str) -> Result<Self, InfraError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        })
    }

    async fn post(&self, message: &EmailMessage) -> Result<SendEmailResponse, InfraError> {
        let body = SendEmailRequest {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
        };
        let response = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<SendEmailResponse>().await?)
    }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
    async fn send(&self, message: &EmailMessage) -> DomainResult<SendReceipt> {
        match self.post(message).await {
            Ok(resp) => {
                debug!(to = %message.to, id = ?resp.id, "Email accepted by Resend");
                Ok(SendReceipt::Delivered {
                    provider_id: resp.id,
                })
            }
            Err(e) => {
                warn!(to = %message.to, error = %e, "Email delivery failed");
                Err(DomainError::UpstreamUnavailable(format!(
                    "email delivery failed: {}",
                    e
                )))
            }
        }
    }
}
