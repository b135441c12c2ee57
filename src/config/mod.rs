//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env (optional, dotenvy) + config file (TOML, optional)
//!     → loader.rs (parse, deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → consumed once by lifecycle::startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Deployment variables (EMAIL_USER, RPC_URL, ...) override file values
//! - Secrets are wrapped so they cannot leak through Debug or Serialize

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ServiceConfig;
pub use schema::{
    ArtifactConfig, HttpConfig, LedgerConfig, ListenerConfig, LogFormat, MailConfig,
    ObservabilityConfig, SecretString, TlsMode,
};
