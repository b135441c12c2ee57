//! Signing identity and nonce bookkeeping.
//!
//! # Security
//! - The key arrives through `LedgerConfig`, never from module-level state
//! - Keys are never logged or serialized

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Wallet for transaction signing with nonce management.
#[derive(Debug, Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
    /// Next nonce this process believes is free.
    next_nonce: Arc<AtomicU64>,
    /// Chain ID for EIP-155 replay protection.
    chain_id: u64,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key (with or without 0x).
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;

        tracing::info!(
            address = %signer.address(),
            chain_id = chain_id,
            "Wallet initialized"
        );

        Ok(Self {
            signer,
            next_nonce: Arc::new(AtomicU64::new(0)),
            chain_id,
        })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Network wallet used to sign transaction requests.
    pub fn network_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }

    /// Pick the nonce for the next transaction.
    ///
    /// Takes the larger of the chain's pending count and the local counter,
    /// so transactions broadcast by this process but not yet visible to the
    /// node are not reused. Callers must hold the submission lock.
    pub fn reserve_nonce(&self, chain_pending: u64) -> u64 {
        let nonce = self.next_nonce.load(Ordering::SeqCst).max(chain_pending);
        self.next_nonce.store(nonce + 1, Ordering::SeqCst);
        nonce
    }

    /// Pull the local counter back to the chain's pending count.
    ///
    /// `reserve_nonce` never moves backwards on its own, so a transaction the
    /// node dropped from its mempool would leave a gap every later nonce sits
    /// behind. Returns `true` when the counter moved. Callers must hold the
    /// submission lock.
    pub fn resync_nonce(&self, chain_pending: u64) -> bool {
        let local = self.next_nonce.load(Ordering::SeqCst);
        if chain_pending >= local {
            return false;
        }
        self.next_nonce.store(chain_pending, Ordering::SeqCst);
        tracing::warn!(local, chain_pending, "Nonce counter resynced to chain");
        true
    }

    /// Give back a reserved nonce whose transaction never reached the network.
    pub fn release_nonce(&self, nonce: u64) {
        let _ = self.next_nonce.compare_exchange(
            nonce + 1,
            nonce,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    pub fn current_nonce(&self) -> u64 {
        self.next_nonce.load(Ordering::SeqCst)
    }
}
