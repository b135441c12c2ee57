//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check addresses, URLs and keys parse before anything is built from them
//! - Validate value ranges (gas limit, polling interval, timeouts)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use alloy::primitives::Address;
use lettre::message::Mailbox;

use crate::config::schema::{LedgerConfig, MailConfig, ServiceConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.http.max_body_size == 0 {
        errors.push(ValidationError::new("http.max_body_size", "must be greater than 0"));
    }

    if config.artifacts.directory.trim().is_empty() {
        errors.push(ValidationError::new("artifacts.directory", "must not be empty"));
    }

    validate_mail(&config.mail, &mut errors);

    if config.ledger.enabled {
        validate_ledger(&config.ledger, &mut errors);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_mail(mail: &MailConfig, errors: &mut Vec<ValidationError>) {
    if mail.smtp_host.trim().is_empty() {
        errors.push(ValidationError::new("mail.smtp_host", "must not be empty"));
    }
    if mail.smtp_port == 0 {
        errors.push(ValidationError::new("mail.smtp_port", "must not be 0"));
    }

    match mail.sender() {
        None => errors.push(ValidationError::new(
            "mail.from_address",
            "sender is required (set from_address, username or EMAIL_USER)",
        )),
        Some(sender) => {
            if sender.parse::<Mailbox>().is_err() {
                errors.push(ValidationError::new(
                    "mail.from_address",
                    format!("'{}' is not a valid mailbox", sender),
                ));
            }
        }
    }

    if url::Url::parse(&mail.default_qr_url).is_err() {
        errors.push(ValidationError::new(
            "mail.default_qr_url",
            format!("'{}' is not a URL", mail.default_qr_url),
        ));
    }
}

fn validate_ledger(ledger: &LedgerConfig, errors: &mut Vec<ValidationError>) {
    if url::Url::parse(&ledger.rpc_url).is_err() {
        errors.push(ValidationError::new(
            "ledger.rpc_url",
            format!("'{}' is not a URL", ledger.rpc_url),
        ));
    }

    if ledger.contract_address.parse::<Address>().is_err() {
        errors.push(ValidationError::new(
            "ledger.contract_address",
            format!("'{}' is not an address", ledger.contract_address),
        ));
    }

    match &ledger.private_key {
        Some(key) if !key.is_empty() => {}
        _ => errors.push(ValidationError::new(
            "ledger.private_key",
            "required when the ledger is enabled (set PRIVATE_KEY)",
        )),
    }

    if ledger.gas_limit == 0 {
        errors.push(ValidationError::new("ledger.gas_limit", "must be greater than 0"));
    }
    if ledger.poll_interval_ms == 0 {
        errors.push(ValidationError::new("ledger.poll_interval_ms", "must be greater than 0"));
    }
    if ledger.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("ledger.rpc_timeout_secs", "must be greater than 0"));
    }
    if ledger.confirmation_blocks == 0 {
        errors.push(ValidationError::new("ledger.confirmation_blocks", "must be at least 1"));
    }
    if ledger.confirmation_timeout_secs == Some(0) {
        errors.push(ValidationError::new(
            "ledger.confirmation_timeout_secs",
            "must be greater than 0 when set",
        ));
    }
    if !(ledger.gas_price_multiplier.is_finite() && ledger.gas_price_multiplier > 0.0) {
        errors.push(ValidationError::new(
            "ledger.gas_price_multiplier",
            "must be a positive number",
        ));
    }
}
