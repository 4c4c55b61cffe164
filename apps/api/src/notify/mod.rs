//! Outbound email.
//!
//! All transactional mail leaves through the [`Mailer`] capability held in
//! `AppState` as `Arc<dyn Mailer>`, so workflow code can be exercised with
//! fakes. The production implementation posts to an HTTP mail relay.
//!
//! Sends are synchronous, best-effort and never retried; a failed send must
//! never roll back the persistence write that preceded it. Call sites
//! downgrade failures to an `email_sent: false` flag in their response.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::errors::AppError;

pub mod templates;

/// A fully composed transactional email.
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError>;
}

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

/// Mailer backed by the transactional mail relay's HTTP API.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    endpoint: String,
    token: String,
    from: String,
}

impl HttpMailer {
    pub fn new(endpoint: String, token: String, from: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint,
            token,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        let body = RelayRequest {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.text,
            html: &message.html,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("mail relay request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "mail relay returned {status}: {detail}"
            )));
        }

        debug!("Sent email '{}' to {}", message.subject, message.to);
        Ok(())
    }
}
