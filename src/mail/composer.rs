//! Message composition.
//!
//! The HTML body and its inline attachment are always produced together from
//! one content-id, so the `cid:` reference cannot drift from the attachment.

use std::path::PathBuf;

use lettre::message::Mailbox;

use crate::artifacts::QrArtifact;
use crate::mail::template::{welcome_html, QR_CONTENT_ID};

/// Name mail clients show for the inline image.
pub const QR_FILENAME: &str = "qrcode.png";

/// Attachment rendered inline through its content-id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAttachment {
    pub path: PathBuf,
    pub content_id: String,
    pub filename: String,
    pub content_type: &'static str,
}

/// A fully composed message, ready for dispatch.
#[derive(Debug, Clone)]
pub struct ComposedMessage {
    pub sender: Mailbox,
    pub recipient: Mailbox,
    pub subject: String,
    pub html_body: String,
    pub attachment: InlineAttachment,
}

/// Builds welcome messages with a fixed sender and subject.
#[derive(Debug, Clone)]
pub struct NotificationComposer {
    sender: Mailbox,
    subject: String,
}

impl NotificationComposer {
    pub fn new(sender: Mailbox, subject: impl Into<String>) -> Self {
        Self {
            sender,
            subject: subject.into(),
        }
    }

    pub fn sender(&self) -> &Mailbox {
        &self.sender
    }

    /// Compose the welcome message for `recipient` around `artifact`.
    pub fn compose(&self, recipient: &Mailbox, artifact: &QrArtifact) -> ComposedMessage {
        ComposedMessage {
            sender: self.sender.clone(),
            recipient: recipient.clone(),
            subject: self.subject.clone(),
            html_body: welcome_html(QR_CONTENT_ID),
            attachment: InlineAttachment {
                path: artifact.path().to_path_buf(),
                content_id: QR_CONTENT_ID.to_string(),
                filename: QR_FILENAME.to_string(),
                content_type: "image/png",
            },
        }
    }
}
