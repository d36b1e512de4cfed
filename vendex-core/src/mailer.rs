//! Outbound mail port and gateway client.
//!
//! Registration dispatches exactly one templated verification email. The
//! workflows depend on the [`Mailer`] trait only; deployments pick between
//! the HTTP gateway client and the log-only fallback at wiring time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Template rendered by the mail gateway for the registration email.
pub const TEMPLATE_EMAIL_VERIFICATION: &str = "email-verification";

/// Subject line of the registration email.
pub const SUBJECT_REGISTRATION: &str = "VENDEX REGISTRATION SUCCESSFUL";

/// Payload handed to the mail gateway alongside a template name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailDetails {
    /// Destination address
    pub recipient: String,
    /// Recipient's full name, available to the template
    pub full_name: String,
    /// Subject line
    pub subject: String,
    /// Action link embedded in the template (verification URL)
    pub link: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail gateway request failed: {0}")]
    Gateway(String),

    #[error("mail gateway rejected the message: status {status}: {message}")]
    Rejected { status: u16, message: String },
}

impl From<reqwest::Error> for MailError {
    fn from(err: reqwest::Error) -> Self {
        MailError::Gateway(err.to_string())
    }
}

/// Dispatches templated email on behalf of the workflows.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        details: EmailDetails,
        template: &str,
    ) -> Result<(), MailError>;
}

/// Mail gateway client: POSTs the details as JSON to the configured
/// endpoint, which owns template rendering and actual delivery.
pub struct HttpMailer {
    http: reqwest::Client,
    gateway_url: String,
    sender: String,
}

impl std::fmt::Debug for HttpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMailer")
            .field("gateway_url", &self.gateway_url)
            .field("sender", &self.sender)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct GatewayRequest<'a> {
    from: &'a str,
    template: &'a str,
    #[serde(flatten)]
    details: &'a EmailDetails,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl HttpMailer {
    pub fn new(gateway_url: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            gateway_url: gateway_url.into(),
            sender: sender.into(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(
        &self,
        details: EmailDetails,
        template: &str,
    ) -> Result<(), MailError> {
        let payload = GatewayRequest {
            from: &self.sender,
            template,
            details: &details,
        };

        let response = self
            .http
            .post(&self.gateway_url)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(
                recipient = %details.recipient,
                template,
                "verification email dispatched"
            );
            return Ok(());
        }

        let message = response
            .json::<GatewayErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| "no detail provided".to_string());

        Err(MailError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Fallback mailer for deployments without a gateway: logs the message
/// instead of delivering it. The verification link still reaches the
/// operator through the log stream, which is enough for dev setups.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(
        &self,
        details: EmailDetails,
        template: &str,
    ) -> Result<(), MailError> {
        tracing::info!(
            recipient = %details.recipient,
            subject = %details.subject,
            link = %details.link,
            template,
            "mail gateway not configured; logging email instead of sending"
        );
        Ok(())
    }
}
