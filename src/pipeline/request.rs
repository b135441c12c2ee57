//! Inbound email request validation.

use lettre::message::Mailbox;
use serde::Deserialize;
use thiserror::Error;

/// Why a request was refused before any work started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing recipient email")]
    MissingRecipient,

    #[error("Invalid recipient email '{0}'")]
    InvalidRecipient(String),

    #[error("qrUrl must not be empty")]
    EmptyUrl,
}

/// Wire body of `POST /api/send-email`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailBody {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub qr_url: Option<String>,
}

/// A validated request: who gets the mail and what the QR code points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRequest {
    pub recipient: Mailbox,
    pub target_url: String,
}

impl EmailRequest {
    /// Validate a wire body, filling in `default_url` when no `qrUrl` is given.
    pub fn from_body(body: SendEmailBody, default_url: &str) -> Result<Self, ValidationError> {
        let to = body
            .to
            .as_deref()
            .map(str::trim)
            .filter(|to| !to.is_empty())
            .ok_or(ValidationError::MissingRecipient)?;

        let recipient: Mailbox = to
            .parse()
            .map_err(|_| ValidationError::InvalidRecipient(to.to_string()))?;

        let target_url = match body.qr_url {
            None => default_url.to_string(),
            Some(url) if url.trim().is_empty() => return Err(ValidationError::EmptyUrl),
            Some(url) => url,
        };

        Ok(Self {
            recipient,
            target_url,
        })
    }
}
