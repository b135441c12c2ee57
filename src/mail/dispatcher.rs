//! SMTP delivery.
//!
//! # Responsibilities
//! - Hold one pooled, authenticated transport to the configured relay
//! - Turn a [`ComposedMessage`] into a `multipart/related` MIME message
//! - Report the Message-ID on acceptance, the transport error otherwise

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{MailConfig, TlsMode};
use crate::mail::composer::ComposedMessage;

/// Errors raised while delivering a message.
#[derive(Debug, Error)]
pub enum SendError {
    /// The MIME message could not be assembled.
    #[error("Failed to build email: {0}")]
    Build(String),

    /// Connection, authentication or recipient failure.
    #[error("Failed to send email: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The relay answered with a non-positive reply.
    #[error("Relay rejected message: {0}")]
    Rejected(String),
}

/// Outcome of an accepted delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub success: bool,
    pub message_id: String,
}

/// Delivers composed messages.
#[async_trait]
pub trait MailDispatcher: Send + Sync {
    /// Send `message`, resolving once the relay accepts or rejects it.
    async fn send(&self, message: &ComposedMessage) -> Result<DeliveryResult, SendError>;
}

/// Assemble the MIME message: HTML part plus the inline image part.
pub fn build_message(
    message: &ComposedMessage,
    attachment: Vec<u8>,
    message_id: &str,
) -> Result<Message, SendError> {
    let content_type = ContentType::parse(message.attachment.content_type)
        .map_err(|e| SendError::Build(e.to_string()))?;
    let image = Attachment::new_inline_with_name(
        message.attachment.content_id.clone(),
        message.attachment.filename.clone(),
    )
    .body(attachment, content_type);

    Message::builder()
        .message_id(Some(message_id.to_string()))
        .from(message.sender.clone())
        .to(message.recipient.clone())
        .subject(message.subject.clone())
        .multipart(
            MultiPart::related()
                .singlepart(SinglePart::html(message.html_body.clone()))
                .singlepart(image),
        )
        .map_err(|e| SendError::Build(e.to_string()))
}

/// `<uuid@domain>` Message-ID scoped to the sender's domain.
pub fn new_message_id(message: &ComposedMessage) -> String {
    format!("<{}@{}>", Uuid::new_v4(), message.sender.email.domain())
}

/// Dispatcher backed by a pooled lettre SMTP transport.
#[derive(Clone)]
pub struct SmtpDispatcher {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
    port: u16,
}

impl SmtpDispatcher {
    /// Build the transport. No connection is opened until the first send.
    pub fn new(config: &MailConfig) -> Result<Self, SendError> {
        let mut builder = match config.tls_mode {
            TlsMode::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            }
            TlsMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?,
            TlsMode::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
            }
        }
        .port(config.smtp_port);

        if let Some(username) = config.username.as_deref().filter(|u| !u.is_empty()) {
            let password = config
                .password
                .as_ref()
                .map(|p| p.expose().to_string())
                .unwrap_or_default();
            builder = builder.credentials(Credentials::new(username.to_string(), password));
        }

        tracing::info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            tls = ?config.tls_mode,
            "SMTP transport configured"
        );

        Ok(Self {
            transport: builder.build(),
            host: config.smtp_host.clone(),
            port: config.smtp_port,
        })
    }

    /// Open a session and check the relay answers.
    pub async fn verify(&self) -> Result<bool, SendError> {
        Ok(self.transport.test_connection().await?)
    }
}

#[async_trait]
impl MailDispatcher for SmtpDispatcher {
    async fn send(&self, message: &ComposedMessage) -> Result<DeliveryResult, SendError> {
        let attachment = tokio::fs::read(&message.attachment.path).await.map_err(|e| {
            SendError::Build(format!(
                "cannot read attachment {}: {}",
                message.attachment.path.display(),
                e
            ))
        })?;

        let message_id = new_message_id(message);
        let email = build_message(message, attachment, &message_id)?;

        let response = self.transport.send(email).await?;
        if !response.is_positive() {
            let reason = response
                .message()
                .map(ToString::to_string)
                .collect::<Vec<String>>()
                .join(" ");
            return Err(SendError::Rejected(reason));
        }

        tracing::info!(
            message_id = %message_id,
            relay = %self.host,
            code = %response.code(),
            "Email accepted by relay"
        );

        Ok(DeliveryResult {
            success: true,
            message_id,
        })
    }
}

impl std::fmt::Debug for SmtpDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpDispatcher")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}
