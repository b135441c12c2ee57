//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{hex, keccak256, Bytes, TxHash};
use async_trait::async_trait;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use qrmail_gateway::artifacts::ArtifactStore;
use qrmail_gateway::blockchain::{
    BlockchainError, ConfirmationStatus, LedgerGateway, ProofSubmission, SubmissionError,
    TransactionRecord,
};
use qrmail_gateway::config::HttpConfig;
use qrmail_gateway::mail::{
    ComposedMessage, DeliveryResult, MailDispatcher, NotificationComposer, SendError,
};
use qrmail_gateway::pipeline::EmailPipeline;
use qrmail_gateway::qr::QrEncoder;
use qrmail_gateway::{AppState, HttpServer, Shutdown};

pub const DEFAULT_QR_URL: &str = "https://yourwebsite.com";

/// Start a scripted SMTP relay on an ephemeral port.
///
/// Accepts every command, refuses recipients containing "reject", and
/// captures each DATA payload.
pub async fn start_mock_smtp() -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let messages = Arc::new(Mutex::new(Vec::new()));
    let captured = messages.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let captured = captured.clone();
            tokio::spawn(async move {
                let (read, mut write) = socket.into_split();
                let mut lines = BufReader::new(read).lines();
                let _ = write.write_all(b"220 mock ESMTP ready\r\n").await;

                while let Ok(Some(line)) = lines.next_line().await {
                    let command = line.to_ascii_uppercase();
                    let reply: &[u8] = if command.starts_with("EHLO") || command.starts_with("HELO") {
                        b"250-mock\r\n250 8BITMIME\r\n"
                    } else if command.starts_with("RCPT") && line.contains("reject") {
                        b"550 5.1.1 Mailbox unavailable\r\n"
                    } else if command.starts_with("DATA") {
                        let _ = write.write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n").await;
                        let mut payload = String::new();
                        while let Ok(Some(data)) = lines.next_line().await {
                            if data == "." {
                                break;
                            }
                            payload.push_str(&data);
                            payload.push('\n');
                        }
                        captured.lock().unwrap().push(payload);
                        b"250 2.0.0 OK queued\r\n"
                    } else if command.starts_with("QUIT") {
                        let _ = write.write_all(b"221 Bye\r\n").await;
                        break;
                    } else {
                        b"250 OK\r\n"
                    };
                    if write.write_all(reply).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    (addr, messages)
}

/// Address of the Anvil test key every ledger test signs with.
pub const SIGNER_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

/// Block the mock node includes every transaction in.
pub const INCLUSION_BLOCK: u64 = 16;

/// How the mock node answers receipt queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptBehavior {
    Success,
    Revert,
    Never,
}

/// A scripted JSON-RPC node.
///
/// Quotes 1 gwei, funds the signer with 1 ether, always reports a pending
/// nonce of 0, and includes every transaction in [`INCLUSION_BLOCK`]. The
/// head starts there and advances by one on each `eth_blockNumber`.
pub struct MockChain {
    receipts: ReceiptBehavior,
    pending_polls: AtomicU64,
    block_number_failures: AtomicU64,
    head: AtomicU64,
    pub calls: Mutex<Vec<String>>,
    pub raw_transactions: Mutex<Vec<Bytes>>,
}

impl MockChain {
    pub fn new(receipts: ReceiptBehavior) -> Self {
        Self {
            receipts,
            pending_polls: AtomicU64::new(0),
            block_number_failures: AtomicU64::new(0),
            head: AtomicU64::new(INCLUSION_BLOCK),
            calls: Mutex::new(Vec::new()),
            raw_transactions: Mutex::new(Vec::new()),
        }
    }

    /// Answer `null` to the first `n` receipt queries.
    pub fn with_pending_polls(self, n: u64) -> Self {
        self.pending_polls.store(n, Ordering::SeqCst);
        self
    }

    /// Fail the first `n` `eth_blockNumber` calls.
    pub fn with_block_number_failures(self, n: u64) -> Self {
        self.block_number_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|m| m.as_str() == method).count()
    }

    pub fn raw_transactions(&self) -> Vec<Bytes> {
        self.raw_transactions.lock().unwrap().clone()
    }

    fn take(counter: &AtomicU64) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn answer(&self, method: &str, params: &Value) -> Result<Value, String> {
        match method {
            "eth_chainId" => Ok(json!("0x7a69")),
            "eth_gasPrice" => Ok(json!("0x3b9aca00")),
            "eth_getBalance" => Ok(json!("0xde0b6b3a7640000")),
            "eth_getTransactionCount" => Ok(json!("0x0")),
            "eth_sendRawTransaction" => {
                let raw = params[0]
                    .as_str()
                    .and_then(|h| hex::decode(h).ok())
                    .ok_or("invalid raw transaction")?;
                let hash = keccak256(&raw);
                self.raw_transactions.lock().unwrap().push(raw.into());
                Ok(json!(hash))
            }
            "eth_getTransactionReceipt" => {
                if self.receipts == ReceiptBehavior::Never || Self::take(&self.pending_polls) {
                    return Ok(Value::Null);
                }
                let status = if self.receipts == ReceiptBehavior::Success { "0x1" } else { "0x0" };
                Ok(json!({
                    "transactionHash": params[0],
                    "transactionIndex": "0x0",
                    "blockHash": format!("0x{}", "11".repeat(32)),
                    "blockNumber": format!("{:#x}", INCLUSION_BLOCK),
                    "from": SIGNER_ADDRESS,
                    "to": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
                    "cumulativeGasUsed": "0x5208",
                    "gasUsed": "0x5208",
                    "effectiveGasPrice": "0x3b9aca00",
                    "contractAddress": null,
                    "logs": [],
                    "logsBloom": format!("0x{}", "00".repeat(256)),
                    "type": "0x0",
                    "status": status,
                }))
            }
            "eth_blockNumber" => {
                if Self::take(&self.block_number_failures) {
                    return Err("header not found".to_string());
                }
                Ok(json!(format!("{:#x}", self.head.fetch_add(1, Ordering::SeqCst))))
            }
            other => Err(format!("method {} not scripted", other)),
        }
    }
}

async fn handle_rpc(State(chain): State<Arc<MockChain>>, Json(request): Json<Value>) -> Json<Value> {
    let id = request["id"].clone();
    let method = request["method"].as_str().unwrap_or_default().to_string();
    chain.calls.lock().unwrap().push(method.clone());

    Json(match chain.answer(&method, &request["params"]) {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err(message) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32000, "message": message },
        }),
    })
}

/// Serve `chain` over HTTP JSON-RPC on an ephemeral port.
pub async fn start_mock_rpc(chain: MockChain) -> (String, Arc<MockChain>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let chain = Arc::new(chain);

    let app = Router::new()
        .route("/", post(handle_rpc))
        .with_state(chain.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{}", addr), chain)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Accept,
    Fail,
    Panic,
}

/// What the mock mailer observed for one send.
#[derive(Debug, Clone)]
pub struct SentMail {
    pub recipient: String,
    pub content_id: String,
    pub attachment: Option<Vec<u8>>,
}

pub struct MockMailer {
    behavior: Behavior,
    pub sent: Mutex<Vec<SentMail>>,
}

impl MockMailer {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailDispatcher for MockMailer {
    async fn send(&self, message: &ComposedMessage) -> Result<DeliveryResult, SendError> {
        self.sent.lock().unwrap().push(SentMail {
            recipient: message.recipient.email.to_string(),
            content_id: message.attachment.content_id.clone(),
            attachment: std::fs::read(&message.attachment.path).ok(),
        });

        match self.behavior {
            Behavior::Accept => Ok(DeliveryResult {
                success: true,
                message_id: "<mock@example.com>".to_string(),
            }),
            Behavior::Fail => Err(SendError::Rejected("535 Authentication failed".to_string())),
            Behavior::Panic => panic!("mailer blew up"),
        }
    }
}

pub struct MockLedger {
    behavior: Behavior,
    pub submissions: Mutex<Vec<Bytes>>,
}

impl MockLedger {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            submissions: Mutex::new(Vec::new()),
        })
    }

    pub fn submissions(&self) -> Vec<Bytes> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerGateway for MockLedger {
    async fn submit_proof(
        &self,
        submission: ProofSubmission,
    ) -> Result<TransactionRecord, SubmissionError> {
        self.submissions.lock().unwrap().push(submission.input_proof);

        match self.behavior {
            Behavior::Accept => Ok(TransactionRecord {
                transaction_hash: TxHash::repeat_byte(0xab),
                status: ConfirmationStatus::Confirmed { block_number: 1 },
            }),
            Behavior::Fail => Err(BlockchainError::Reverted(TxHash::repeat_byte(0xab))),
            Behavior::Panic => panic!("ledger blew up"),
        }
    }
}

pub fn pipeline(dir: &Path, mailer: Arc<dyn MailDispatcher>) -> EmailPipeline {
    EmailPipeline::new(
        ArtifactStore::new(dir),
        QrEncoder::default(),
        NotificationComposer::new(
            "noreply@example.com".parse().unwrap(),
            "Welcome to Our Platform!",
        ),
        mailer,
    )
}

pub fn app_state(
    dir: &Path,
    mailer: Arc<dyn MailDispatcher>,
    ledger: Option<Arc<dyn LedgerGateway>>,
) -> AppState {
    AppState {
        pipeline: pipeline(dir, mailer),
        ledger,
        default_qr_url: Arc::from(DEFAULT_QR_URL),
    }
}

/// Serve `state` on an ephemeral port until the returned handle is triggered.
pub async fn spawn_gateway(state: AppState) -> (String, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(&HttpConfig::default(), state);
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (format!("http://{}", addr), shutdown)
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

/// Poll until `dir` is empty; cleanup after an abandoned handler lands once
/// the server drops the request future.
pub async fn wait_until_empty(dir: &Path) -> bool {
    for _ in 0..100 {
        if dir_is_empty(dir) {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    dir_is_empty(dir)
}
