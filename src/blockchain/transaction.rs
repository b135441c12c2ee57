//! Transaction building, signing, and confirmation monitoring.
//!
//! # Responsibilities
//! - Encode the `postInputProof(bytes)` call
//! - Price the transaction (gas ceiling, multiplier, balance check)
//! - Sign legacy transactions with the configured wallet
//! - Monitor confirmations

use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use std::time::Duration;
use tokio::time::{interval, timeout, Instant};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus};
use crate::blockchain::wallet::Wallet;

alloy::sol! {
    function postInputProof(bytes inputProof) external;
}

/// ABI-encoded calldata for `postInputProof(inputProof)`.
pub fn encode_post_input_proof(input_proof: Bytes) -> Bytes {
    postInputProofCall {
        inputProof: input_proof,
    }
    .abi_encode()
    .into()
}

/// Blocks of depth a receipt has, counting its own block.
pub fn confirmation_depth(current_block: u64, tx_block: u64) -> u64 {
    current_block.saturating_sub(tx_block) + 1
}

/// Fee policy applied to every submission.
#[derive(Debug, Clone, Copy)]
pub struct GasPolicy {
    pub gas_limit: u64,
    pub price_multiplier: f64,
    pub max_price_gwei: u64,
}

impl GasPolicy {
    /// Apply the multiplier to a node-quoted gas price, then the ceiling.
    ///
    /// The ceiling bounds the price that actually gets signed.
    pub fn adjust(&self, quoted_wei: u128) -> BlockchainResult<u128> {
        let adjusted = (quoted_wei as f64 * self.price_multiplier) as u128;
        let max_wei = u128::from(self.max_price_gwei) * 1_000_000_000;
        if adjusted > max_wei {
            return Err(BlockchainError::GasPriceTooHigh {
                current_gwei: u64::try_from(adjusted / 1_000_000_000).unwrap_or(u64::MAX),
                max_gwei: self.max_price_gwei,
            });
        }
        Ok(adjusted)
    }

    /// Worst-case fee for one transaction at `gas_price`.
    pub fn max_fee(&self, gas_price: u128) -> U256 {
        U256::from(self.gas_limit) * U256::from(gas_price)
    }
}

/// Transaction builder bound to one client and wallet.
pub struct TxBuilder {
    client: BlockchainClient,
    wallet: Wallet,
    policy: GasPolicy,
}

impl TxBuilder {
    pub fn new(client: BlockchainClient, wallet: Wallet, policy: GasPolicy) -> Self {
        Self {
            client,
            wallet,
            policy,
        }
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn client(&self) -> &BlockchainClient {
        &self.client
    }

    /// Quote a gas price and make sure the wallet can pay for the full gas limit.
    pub async fn price(&self) -> BlockchainResult<u128> {
        let gas_price = self.policy.adjust(self.client.get_gas_price().await?)?;

        let balance = self.client.get_balance(self.wallet.address()).await?;
        let required = self.policy.max_fee(gas_price);
        if balance < required {
            return Err(BlockchainError::InsufficientFunds {
                balance: balance.to_string(),
                required: required.to_string(),
            });
        }

        Ok(gas_price)
    }

    /// Legacy transaction calling `to` with `data`.
    pub fn build(&self, to: Address, data: Bytes, nonce: u64, gas_price: u128) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.wallet.address())
            .with_to(to)
            .with_input(data)
            .with_nonce(nonce)
            .with_gas_price(gas_price)
            .with_gas_limit(self.policy.gas_limit)
            .with_chain_id(self.wallet.chain_id())
    }

    /// Sign and EIP-2718 encode a transaction, ready for `eth_sendRawTransaction`.
    pub async fn sign(&self, tx: TransactionRequest) -> BlockchainResult<Vec<u8>> {
        let envelope = tx
            .build(&self.wallet.network_wallet())
            .await
            .map_err(|e| BlockchainError::Signing(e.to_string()))?;
        Ok(envelope.encoded_2718())
    }

    /// Wait for a transaction to reach `required` blocks of depth.
    ///
    /// With `max_wait` unset this polls until a receipt shows up.
    pub async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        required: u64,
        poll_interval: Duration,
        max_wait: Option<Duration>,
    ) -> BlockchainResult<ConfirmationStatus> {
        let started = Instant::now();
        let poll = self.poll_receipt(tx_hash, required, poll_interval);

        match max_wait {
            None => poll.await,
            Some(limit) => match timeout(limit, poll).await {
                Ok(status) => status,
                Err(_) => Err(BlockchainError::ConfirmationTimeout {
                    tx_hash,
                    waited_secs: started.elapsed().as_secs(),
                }),
            },
        }
    }

    async fn poll_receipt(
        &self,
        tx_hash: TxHash,
        required: u64,
        poll_interval: Duration,
    ) -> BlockchainResult<ConfirmationStatus> {
        let mut ticker = interval(poll_interval);

        loop {
            ticker.tick().await;

            let receipt = match self.client.get_transaction_receipt(tx_hash).await {
                Ok(Some(r)) => r,
                Ok(None) => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    continue;
                }
                // Transient RPC trouble while waiting; the transaction is already out.
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed");
                    continue;
                }
            };

            if !receipt.status() {
                return Ok(ConfirmationStatus::Failed("Transaction reverted".to_string()));
            }

            let current_block = match self.client.get_block_number().await {
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, error = %e, "Block number poll failed");
                    continue;
                }
            };
            let tx_block = receipt.block_number.unwrap_or(current_block);
            let depth = confirmation_depth(current_block, tx_block);

            if depth >= required {
                return Ok(ConfirmationStatus::Confirmed {
                    block_number: tx_block,
                });
            }

            tracing::debug!(
                tx_hash = %tx_hash,
                confirmations = depth,
                required = required,
                "Waiting for confirmations"
            );
        }
    }
}
