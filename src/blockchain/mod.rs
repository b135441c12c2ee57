//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! LedgerConfig (private key, RPC URL, contract)
//!     → wallet.rs (key loading, signing, nonce reservation)
//!     → client.rs (RPC connection with timeouts and failover)
//!     → transaction.rs (calldata, pricing, sign, confirm)
//!     → gateway.rs (serialized submission, LedgerGateway trait)
//! ```
//!
//! # Security Constraints
//! - Keys come from configuration, never module-level state
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod gateway;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use gateway::{ContractGateway, LedgerGateway};
pub use types::{
    BlockchainError, ChainId, ConfirmationStatus, ProofSubmission, SubmissionError,
    TransactionRecord,
};
pub use wallet::Wallet;
