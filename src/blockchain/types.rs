//! Ledger types and error definitions.

use alloy::primitives::{Bytes, TxHash};
use serde::Deserialize;
use thiserror::Error;

pub use crate::config::schema::LedgerConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Errors that can occur while submitting a proof.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Transaction was not confirmed within the configured wait.
    #[error("Transaction {tx_hash} not confirmed after {waited_secs} seconds")]
    ConfirmationTimeout { tx_hash: TxHash, waited_secs: u64 },

    /// Transaction was mined but reverted.
    #[error("Transaction reverted: {0}")]
    Reverted(TxHash),

    /// Invalid private key format or derivation error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Building or signing the transaction failed.
    #[error("Signing error: {0}")]
    Signing(String),

    /// The signing account cannot cover the fee.
    #[error("Insufficient funds: balance {balance} wei, need {required} wei")]
    InsufficientFunds { balance: String, required: String },

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Ledger gateway not configured.
    #[error("Ledger not available: {0}")]
    NotAvailable(String),
}

/// Error surfaced by a proof submission.
pub type SubmissionError = BlockchainError;

/// Result type for ledger operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Final state of a watched transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Included with the required depth.
    Confirmed { block_number: u64 },
    /// Mined and reverted.
    Failed(String),
}

/// Proof payload accepted by `/contract/interact`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofSubmission {
    /// Hex-encoded proof bytes, passed to the contract untouched.
    pub input_proof: Bytes,
    /// Opaque handle supplied by the caller. Logged, not forwarded.
    #[serde(default)]
    pub handle: Option<serde_json::Value>,
}

/// A confirmed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub transaction_hash: TxHash,
    pub status: ConfirmationStatus,
}
