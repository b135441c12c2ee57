//! Proof submission to the `postInputProof(bytes)` contract.
//!
//! Nonce selection, signing and broadcast for one wallet run under a single
//! async lock. Confirmation waits happen outside it, so several submissions
//! can be in flight while nonces stay strictly increasing.

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::transaction::{encode_post_input_proof, GasPolicy, TxBuilder};
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, ConfirmationStatus, LedgerConfig, ProofSubmission,
    SubmissionError, TransactionRecord,
};
use crate::blockchain::wallet::Wallet;
use crate::observability::metrics;

/// Submits proofs to the ledger.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Submit `submission` and resolve once the transaction is confirmed.
    async fn submit_proof(
        &self,
        submission: ProofSubmission,
    ) -> Result<TransactionRecord, SubmissionError>;
}

/// Gateway signing with a local key and talking JSON-RPC.
pub struct ContractGateway {
    builder: TxBuilder,
    contract: Address,
    submit_lock: Mutex<()>,
    confirmation_blocks: u64,
    poll_interval: Duration,
    confirmation_timeout: Option<Duration>,
}

impl ContractGateway {
    /// Build the gateway from configuration.
    ///
    /// Queries the chain id only when `chain_id` is not configured.
    pub async fn new(config: &LedgerConfig) -> BlockchainResult<Self> {
        let client = BlockchainClient::new(config)?;

        let contract: Address = config.contract_address.parse().map_err(|e| {
            BlockchainError::NotAvailable(format!(
                "invalid contract address '{}': {}",
                config.contract_address, e
            ))
        })?;

        let private_key = config
            .private_key
            .as_ref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| BlockchainError::Wallet("private key not configured".to_string()))?;

        let chain_id = match config.chain_id {
            Some(id) => id,
            None => client.get_chain_id().await?.0,
        };

        let wallet = Wallet::from_private_key(private_key.expose(), chain_id)?;
        let policy = GasPolicy {
            gas_limit: config.gas_limit,
            price_multiplier: config.gas_price_multiplier,
            max_price_gwei: config.max_gas_price_gwei,
        };

        tracing::info!(
            contract = %contract,
            signer = %wallet.address(),
            chain_id,
            gas_limit = config.gas_limit,
            "Ledger gateway ready"
        );

        Ok(Self {
            builder: TxBuilder::new(client, wallet, policy),
            contract,
            submit_lock: Mutex::new(()),
            confirmation_blocks: u64::from(config.confirmation_blocks),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            confirmation_timeout: config.confirmation_timeout_secs.map(Duration::from_secs),
        })
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn signer(&self) -> Address {
        self.builder.wallet().address()
    }

    /// Compare the node's chain id with the one the wallet signs for.
    pub async fn verify_chain(&self) -> BlockchainResult<()> {
        let expected = self.builder.wallet().chain_id();
        let actual = self.builder.client().get_chain_id().await?.0;
        if actual != expected {
            return Err(BlockchainError::ChainMismatch { expected, actual });
        }
        Ok(())
    }

    /// Nonce, price, sign and broadcast under the submission lock.
    async fn broadcast(&self, submission: &ProofSubmission) -> BlockchainResult<TxHash> {
        let _guard = self.submit_lock.lock().await;

        let wallet = self.builder.wallet();
        let client = self.builder.client();

        let gas_price = self.builder.price().await?;
        let chain_nonce = client.get_pending_nonce(wallet.address()).await?;
        let nonce = wallet.reserve_nonce(chain_nonce);

        let calldata = encode_post_input_proof(submission.input_proof.clone());
        let tx = self.builder.build(self.contract, calldata, nonce, gas_price);

        let sent = match self.builder.sign(tx).await {
            Ok(raw) => client.send_raw_transaction(&raw).await,
            Err(e) => Err(e),
        };

        match sent {
            Ok(tx_hash) => {
                tracing::info!(
                    tx_hash = %tx_hash,
                    nonce,
                    gas_price,
                    proof_len = submission.input_proof.len(),
                    "Proof transaction broadcast"
                );
                Ok(tx_hash)
            }
            Err(e) => {
                wallet.release_nonce(nonce);
                Err(e)
            }
        }
    }

    /// Re-read the pending nonce after a transaction went missing.
    async fn resync_nonce(&self) {
        let _guard = self.submit_lock.lock().await;
        let wallet = self.builder.wallet();
        match self.builder.client().get_pending_nonce(wallet.address()).await {
            Ok(pending) => {
                wallet.resync_nonce(pending);
            }
            Err(e) => tracing::warn!(error = %e, "Nonce resync skipped"),
        }
    }

    async fn submit(&self, submission: ProofSubmission) -> BlockchainResult<TransactionRecord> {
        tracing::debug!(handle = ?submission.handle, "Submitting input proof");

        let tx_hash = self.broadcast(&submission).await?;

        let wait_started = Instant::now();
        let status = match self
            .builder
            .wait_for_confirmation(
                tx_hash,
                self.confirmation_blocks,
                self.poll_interval,
                self.confirmation_timeout,
            )
            .await
        {
            Ok(status) => status,
            Err(e @ BlockchainError::ConfirmationTimeout { .. }) => {
                tracing::warn!(tx_hash = %tx_hash, error = %e, "Confirmation wait expired");
                self.resync_nonce().await;
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        metrics::record_confirmation_wait(wait_started);

        match status {
            ConfirmationStatus::Failed(reason) => {
                tracing::warn!(tx_hash = %tx_hash, reason = %reason, "Proof transaction failed");
                Err(BlockchainError::Reverted(tx_hash))
            }
            status => {
                tracing::info!(tx_hash = %tx_hash, status = ?status, "Proof transaction confirmed");
                Ok(TransactionRecord {
                    transaction_hash: tx_hash,
                    status,
                })
            }
        }
    }
}

#[async_trait]
impl LedgerGateway for ContractGateway {
    async fn submit_proof(
        &self,
        submission: ProofSubmission,
    ) -> Result<TransactionRecord, SubmissionError> {
        let result = self.submit(submission).await;
        metrics::record_ledger_submission(if result.is_ok() { "confirmed" } else { "failed" });
        result
    }
}

impl std::fmt::Debug for ContractGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractGateway")
            .field("contract", &self.contract)
            .field("signer", &self.signer())
            .field("confirmation_blocks", &self.confirmation_blocks)
            .finish()
    }
}
