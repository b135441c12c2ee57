//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{SecretString, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV_VAR: &str = "QRMAIL_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {message}")]
    Env { var: &'static str, message: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the TOML file (if any), then
/// environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay process environment onto a config.
///
/// `lookup` abstracts `std::env::var` so overrides can be tested without
/// touching the real environment. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(port) = get("PORT") {
        let port: u16 = port.parse().map_err(|_| ConfigError::Env {
            var: "PORT",
            message: format!("'{}' is not a port number", port),
        })?;
        config.listener.bind_address = format!("0.0.0.0:{}", port);
    }

    if let Some(host) = get("SMTP_HOST") {
        config.mail.smtp_host = host;
    }
    if let Some(port) = get("SMTP_PORT") {
        config.mail.smtp_port = port.parse().map_err(|_| ConfigError::Env {
            var: "SMTP_PORT",
            message: format!("'{}' is not a port number", port),
        })?;
    }
    if let Some(user) = get("EMAIL_USER") {
        config.mail.username = Some(user);
    }
    if let Some(password) = get("EMAIL_PASSWORD") {
        config.mail.password = Some(SecretString::new(password));
    }
    if let Some(dir) = get("QR_DIR") {
        config.artifacts.directory = dir;
    }

    if let Some(url) = get("RPC_URL") {
        config.ledger.rpc_url = url;
    }
    if let Some(key) = get("PRIVATE_KEY") {
        config.ledger.private_key = Some(SecretString::new(key));
    }
    if let Some(address) = get("CONTRACT_ADDRESS") {
        config.ledger.contract_address = address;
        config.ledger.enabled = true;
    }

    Ok(())
}
