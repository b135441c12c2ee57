//! `ContractGateway` against a scripted JSON-RPC node.

use std::sync::Arc;

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{keccak256, Address, Bytes};
use qrmail_gateway::blockchain::transaction::encode_post_input_proof;
use qrmail_gateway::blockchain::{
    BlockchainError, ConfirmationStatus, ContractGateway, LedgerGateway, ProofSubmission,
};
use qrmail_gateway::config::{LedgerConfig, SecretString};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;

mod common;

use common::{
    app_state, spawn_gateway, start_mock_rpc, Behavior, MockChain, MockMailer, ReceiptBehavior,
    INCLUSION_BLOCK,
};

const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
const TEST_PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

fn ledger_config(rpc_url: &str) -> LedgerConfig {
    LedgerConfig {
        enabled: true,
        rpc_url: rpc_url.to_string(),
        chain_id: Some(31337),
        contract_address: CONTRACT.to_string(),
        private_key: Some(SecretString::new(TEST_PRIVATE_KEY)),
        rpc_timeout_secs: 2,
        poll_interval_ms: 10,
        ..LedgerConfig::default()
    }
}

fn proof(bytes: &[u8]) -> ProofSubmission {
    ProofSubmission {
        input_proof: Bytes::copy_from_slice(bytes),
        handle: None,
    }
}

fn decode(raw: &Bytes) -> TxEnvelope {
    TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap()
}

#[tokio::test]
async fn proof_resolves_only_after_required_depth() {
    let (url, chain) =
        start_mock_rpc(MockChain::new(ReceiptBehavior::Success).with_pending_polls(2)).await;
    let config = LedgerConfig {
        confirmation_blocks: 2,
        ..ledger_config(&url)
    };
    let gateway = ContractGateway::new(&config).await.unwrap();

    let record = gateway.submit_proof(proof(&[0x12, 0x34])).await.unwrap();

    assert_eq!(
        record.status,
        ConfirmationStatus::Confirmed {
            block_number: INCLUSION_BLOCK
        }
    );
    // Two pending polls, then the receipt; head 16 is depth 1, head 17 depth 2.
    assert_eq!(chain.count("eth_getTransactionReceipt"), 4);
    assert_eq!(chain.count("eth_blockNumber"), 2);
    assert_eq!(chain.calls().last().map(String::as_str), Some("eth_blockNumber"));

    let raw = chain.raw_transactions();
    assert_eq!(raw.len(), 1);
    assert_eq!(record.transaction_hash, keccak256(&raw[0]));
}

#[tokio::test]
async fn one_legacy_transaction_carries_the_proof() {
    let (url, chain) = start_mock_rpc(MockChain::new(ReceiptBehavior::Success)).await;
    let gateway = ContractGateway::new(&ledger_config(&url)).await.unwrap();

    gateway.submit_proof(proof(&[0x12, 0x34])).await.unwrap();

    assert_eq!(chain.count("eth_sendRawTransaction"), 1);
    let tx = decode(&chain.raw_transactions()[0]);
    assert!(tx.is_legacy());
    assert_eq!(tx.gas_limit(), 7_000_000);
    assert_eq!(tx.gas_price(), Some(1_000_000_000));
    assert_eq!(tx.nonce(), 0);
    assert_eq!(tx.to(), Some(CONTRACT.parse::<Address>().unwrap()));
    assert_eq!(tx.input(), &encode_post_input_proof(Bytes::from(vec![0x12, 0x34])));
}

#[tokio::test]
async fn reverted_receipt_fails_submission() {
    let (url, chain) = start_mock_rpc(MockChain::new(ReceiptBehavior::Revert)).await;
    let gateway = ContractGateway::new(&ledger_config(&url)).await.unwrap();

    let err = gateway.submit_proof(proof(&[0x01])).await.unwrap_err();

    let raw = chain.raw_transactions();
    assert!(matches!(err, BlockchainError::Reverted(hash) if hash == keccak256(&raw[0])));
}

#[tokio::test]
async fn block_number_error_after_receipt_is_retried() {
    let (url, chain) = start_mock_rpc(
        MockChain::new(ReceiptBehavior::Success).with_block_number_failures(1),
    )
    .await;
    let gateway = ContractGateway::new(&ledger_config(&url)).await.unwrap();

    let record = gateway.submit_proof(proof(&[0x12, 0x34])).await.unwrap();

    assert!(matches!(record.status, ConfirmationStatus::Confirmed { .. }));
    assert_eq!(chain.count("eth_blockNumber"), 2);
    assert_eq!(chain.count("eth_sendRawTransaction"), 1);
}

#[tokio::test]
async fn concurrent_submissions_take_increasing_nonces() {
    let (url, chain) = start_mock_rpc(MockChain::new(ReceiptBehavior::Success)).await;
    let gateway = Arc::new(ContractGateway::new(&ledger_config(&url)).await.unwrap());

    let mut tasks = Vec::new();
    for i in 0..4u8 {
        let gateway = gateway.clone();
        tasks.push(tokio::spawn(async move { gateway.submit_proof(proof(&[i])).await }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let nonces: Vec<u64> = chain.raw_transactions().iter().map(|raw| decode(raw).nonce()).collect();
    assert_eq!(nonces, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn confirmation_timeout_is_reported_and_nonce_reused() {
    let (url, chain) = start_mock_rpc(MockChain::new(ReceiptBehavior::Never)).await;
    let config = LedgerConfig {
        confirmation_timeout_secs: Some(1),
        ..ledger_config(&url)
    };
    let gateway = ContractGateway::new(&config).await.unwrap();

    let err = gateway.submit_proof(proof(&[0x01])).await.unwrap_err();
    assert!(matches!(err, BlockchainError::ConfirmationTimeout { .. }));

    // The node still reports nonce 0 pending, so the next submission fills the gap.
    let err = gateway.submit_proof(proof(&[0x02])).await.unwrap_err();
    assert!(matches!(err, BlockchainError::ConfirmationTimeout { .. }));

    let nonces: Vec<u64> = chain.raw_transactions().iter().map(|raw| decode(raw).nonce()).collect();
    assert_eq!(nonces, vec![0, 0]);
}

#[tokio::test]
async fn contract_endpoint_drives_real_gateway() {
    let (url, chain) = start_mock_rpc(MockChain::new(ReceiptBehavior::Success)).await;
    let gateway: Arc<dyn LedgerGateway> =
        Arc::new(ContractGateway::new(&ledger_config(&url)).await.unwrap());
    let dir = TempDir::new().unwrap();
    let (base, shutdown) = spawn_gateway(app_state(
        dir.path(),
        MockMailer::new(Behavior::Accept),
        Some(gateway),
    ))
    .await;

    let res = reqwest::Client::new()
        .post(format!("{}/contract/interact", base))
        .json(&json!({ "inputProof": "0x1234", "handle": "0xabcd" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "success": true }));
    assert_eq!(chain.count("eth_sendRawTransaction"), 1);
    shutdown.trigger();
}

#[tokio::test]
async fn contract_endpoint_reports_revert_as_server_error() {
    let (url, _chain) = start_mock_rpc(MockChain::new(ReceiptBehavior::Revert)).await;
    let gateway: Arc<dyn LedgerGateway> =
        Arc::new(ContractGateway::new(&ledger_config(&url)).await.unwrap());
    let dir = TempDir::new().unwrap();
    let (base, shutdown) = spawn_gateway(app_state(
        dir.path(),
        MockMailer::new(Behavior::Accept),
        Some(gateway),
    ))
    .await;

    let res = reqwest::Client::new()
        .post(format!("{}/contract/interact", base))
        .json(&json!({ "inputProof": "0x1234" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].is_string());
    shutdown.trigger();
}
