//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Fallback URL encoded when a request carries no `qrUrl`.
pub const DEFAULT_QR_URL: &str = "https://yourwebsite.com";

/// Fixed gas ceiling for `postInputProof` submissions.
pub const DEFAULT_GAS_LIMIT: u64 = 7_000_000;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// HTTP surface settings (body limit, CORS).
    pub http: HttpConfig,

    /// Transient artifact directory.
    pub artifacts: ArtifactConfig,

    /// SMTP relay and message settings.
    pub mail: MailConfig,

    /// Ledger (contract submission) settings.
    pub ledger: LedgerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// A secret value that never shows up in logs or serialized output.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(***)")
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Allow any origin.
    pub cors_enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
            cors_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Directory holding generated QR images for the lifetime of one request.
    pub directory: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            directory: "/tmp/qr-codes".to_string(),
        }
    }
}

/// How the SMTP session is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plaintext only. Local relays and tests.
    None,
    /// Plain connect, then upgrade with STARTTLS (port 587).
    Starttls,
    /// TLS from the first byte (port 465).
    Tls,
}

/// SMTP relay and message settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub tls_mode: TlsMode,

    /// SMTP username. Credentials are only sent when this is non-empty.
    pub username: Option<String>,

    #[serde(skip_serializing)]
    pub password: Option<SecretString>,

    /// Sender address. Falls back to the username when unset.
    pub from_address: Option<String>,

    /// Optional display name for the sender.
    pub from_name: Option<String>,

    pub subject: String,

    /// URL encoded when the caller does not supply one.
    pub default_qr_url: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            tls_mode: TlsMode::Starttls,
            username: None,
            password: None,
            from_address: None,
            from_name: None,
            subject: "Welcome to Our Platform!".to_string(),
            default_qr_url: DEFAULT_QR_URL.to_string(),
        }
    }
}

impl MailConfig {
    /// The effective sender address.
    pub fn sender(&self) -> Option<&str> {
        self.from_address
            .as_deref()
            .or(self.username.as_deref())
            .filter(|s| !s.trim().is_empty())
    }
}

/// Ledger integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Enable the `/contract/interact` endpoint.
    pub enabled: bool,

    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID for signing. Queried from the RPC at startup when unset.
    pub chain_id: Option<u64>,

    /// Address of the contract exposing `postInputProof(bytes)`.
    pub contract_address: String,

    /// Hex private key of the submitting account.
    #[serde(skip_serializing)]
    pub private_key: Option<SecretString>,

    /// Gas limit attached to every submission.
    pub gas_limit: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Blocks (including the inclusion block) required for confirmation.
    pub confirmation_blocks: u32,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Upper bound on the confirmation wait. Unbounded when unset.
    pub confirmation_timeout_secs: Option<u64>,

    /// Gas price multiplier (1.0 = node estimate, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: None,
            contract_address: String::new(),
            private_key: None,
            gas_limit: DEFAULT_GAS_LIMIT,
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            poll_interval_ms: 2000,
            confirmation_timeout_secs: None,
            gas_price_multiplier: 1.0,
            max_gas_price_gwei: 500,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
