//! Mail subsystem.
//!
//! # Data Flow
//! ```text
//! recipient + QrArtifact
//!     → composer.rs (sender, subject, HTML body, inline attachment)
//!     → dispatcher.rs (MIME assembly, SMTP session, Message-ID)
//! ```

pub mod composer;
pub mod dispatcher;
pub mod template;

pub use composer::{ComposedMessage, InlineAttachment, NotificationComposer};
pub use dispatcher::{DeliveryResult, MailDispatcher, SendError, SmtpDispatcher};
