//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order:
//!   artifact directory → mailer → ledger
//! - Hand the wired [`AppState`] to the HTTP server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - An unreachable SMTP relay is only a warning; sends report their own errors
//! - Listeners start last (traffic only when ready)

use std::sync::Arc;

use lettre::message::Mailbox;
use thiserror::Error;

use crate::artifacts::ArtifactStore;
use crate::blockchain::{BlockchainError, ContractGateway, LedgerGateway};
use crate::config::{MailConfig, ServiceConfig};
use crate::http::AppState;
use crate::mail::{MailDispatcher, NotificationComposer, SendError, SmtpDispatcher};
use crate::pipeline::EmailPipeline;
use crate::qr::QrEncoder;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Cannot create artifact directory {path}: {source}")]
    ArtifactDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid sender: {0}")]
    Sender(String),

    #[error("Mailer setup failed: {0}")]
    Mailer(#[from] SendError),

    #[error("Ledger setup failed: {0}")]
    Ledger(#[from] BlockchainError),
}

/// Sender mailbox from `from_address`/`username`, plus the optional display name.
pub fn sender_mailbox(config: &MailConfig) -> Result<Mailbox, StartupError> {
    let address = config
        .sender()
        .ok_or_else(|| StartupError::Sender("no sender address configured".to_string()))?;
    let mut mailbox: Mailbox = address
        .parse()
        .map_err(|e| StartupError::Sender(format!("'{}': {}", address, e)))?;
    if mailbox.name.is_none() {
        mailbox.name = config.from_name.clone();
    }
    Ok(mailbox)
}

/// Build every subsystem and return the handler state.
pub async fn initialize(config: &ServiceConfig) -> Result<AppState, StartupError> {
    let store = ArtifactStore::new(&config.artifacts.directory);
    store
        .ensure_directory()
        .await
        .map_err(|source| StartupError::ArtifactDirectory {
            path: config.artifacts.directory.clone(),
            source,
        })?;
    tracing::info!(directory = %config.artifacts.directory, "Artifact directory ready");

    let smtp = SmtpDispatcher::new(&config.mail)?;
    match smtp.verify().await {
        Ok(true) => tracing::info!(host = %config.mail.smtp_host, "SMTP relay reachable"),
        Ok(false) => tracing::warn!(host = %config.mail.smtp_host, "SMTP relay did not accept a test session"),
        Err(e) => tracing::warn!(host = %config.mail.smtp_host, error = %e, "SMTP relay check failed"),
    }
    let dispatcher: Arc<dyn MailDispatcher> = Arc::new(smtp);

    let composer = NotificationComposer::new(sender_mailbox(&config.mail)?, &config.mail.subject);
    let pipeline = EmailPipeline::new(store, QrEncoder::default(), composer, dispatcher);

    let ledger = if config.ledger.enabled {
        let gateway = ContractGateway::new(&config.ledger).await?;
        if config.ledger.chain_id.is_some() {
            if let Err(e) = gateway.verify_chain().await {
                tracing::warn!(error = %e, "Chain check failed");
            }
        }
        Some(Arc::new(gateway) as Arc<dyn LedgerGateway>)
    } else {
        tracing::info!("Ledger disabled; /contract/interact will answer 503");
        None
    };

    Ok(AppState {
        pipeline,
        ledger,
        default_qr_url: Arc::from(config.mail.default_qr_url.as_str()),
    })
}
