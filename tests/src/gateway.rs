//! Local HTTP stand-ins for the ledger gateway and the pinning service.
//!
//! `LedgerGateway` serves the ledger JSON-RPC method table on a loopback
//! port, backed by an `InMemoryLedger`. Writes apply immediately; when their
//! receipts become visible is governed by a `ReceiptMode`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use medledger_registry::{
    InMemoryLedger, LedgerClient, LedgerError, MintRequest, NewAdmin, NewPatient,
};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shared_types::{Address, ContentId, RecordId};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

const WRITE_METHODS: [&str; 3] = ["ledger_mintRecord", "ledger_addAdmin", "ledger_addPatient"];

/// When a submitted write's receipt becomes final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptMode {
    /// Final after this many `null` receipt polls.
    Delayed(usize),
    /// Never final.
    Never,
    /// The gateway answers the write with its tx hash, then stops listening.
    VanishAfterSubmit,
}

struct PendingReceipt {
    polls_left: usize,
    receipt: Value,
}

struct GatewayState {
    ledger: Arc<InMemoryLedger>,
    receipts: Mutex<HashMap<String, PendingReceipt>>,
    next_tx: Mutex<u64>,
    mode: Mutex<ReceiptMode>,
    shutdown: Notify,
}

/// Running gateway. Aborted on drop.
pub struct LedgerGateway {
    addr: SocketAddr,
    state: Arc<GatewayState>,
    handle: JoinHandle<()>,
}

impl LedgerGateway {
    pub async fn start(ledger: Arc<InMemoryLedger>, mode: ReceiptMode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind gateway");
        let addr = listener.local_addr().expect("gateway addr");
        let state = Arc::new(GatewayState {
            ledger,
            receipts: Mutex::new(HashMap::new()),
            next_tx: Mutex::new(1),
            mode: Mutex::new(mode),
            shutdown: Notify::new(),
        });

        let router = Router::new()
            .route("/", post(handle_json_rpc))
            .with_state(Arc::clone(&state));

        let signal = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router)
                .with_graceful_shutdown(async move { signal.shutdown.notified().await })
                .await;
        });
        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Applies to writes submitted from now on.
    pub fn set_receipt_mode(&self, mode: ReceiptMode) {
        *self.state.mode.lock() = mode;
    }
}

impl Drop for LedgerGateway {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// An endpoint nothing listens on.
pub async fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

async fn handle_json_rpc(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<Value>,
) -> impl IntoResponse {
    let id = request.get("id").cloned().unwrap_or(json!(0));
    let method = request
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let params = request
        .get("params")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let response = match state.dispatch(&method, &params).await {
        Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
        Err(error) => json!({"jsonrpc": "2.0", "id": id, "error": error_object(error)}),
    };

    let mode = *state.mode.lock();
    if mode == ReceiptMode::VanishAfterSubmit && WRITE_METHODS.contains(&method.as_str()) {
        state.shutdown.notify_one();
    }

    // One request per connection, so a stopped gateway is seen by the next call.
    ([(header::CONNECTION, "close")], Json(response))
}

fn error_object(error: LedgerError) -> Value {
    match error {
        LedgerError::Reverted { reason } => {
            let reason = reason.unwrap_or_default();
            json!({"code": 3, "message": format!("execution reverted: {reason}"), "data": reason})
        }
        LedgerError::Rejected(message) => json!({"code": -32000, "message": message}),
        other => json!({"code": -32603, "message": other.to_string()}),
    }
}

fn param<T: DeserializeOwned>(params: &[Value], index: usize) -> Result<T, LedgerError> {
    params
        .get(index)
        .cloned()
        .ok_or_else(|| LedgerError::Rejected(format!("missing param {index}")))
        .and_then(|v| {
            serde_json::from_value(v).map_err(|e| LedgerError::Rejected(e.to_string()))
        })
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, LedgerError> {
    serde_json::to_value(value).map_err(|e| LedgerError::Rejected(e.to_string()))
}

impl GatewayState {
    async fn dispatch(&self, method: &str, params: &[Value]) -> Result<Value, LedgerError> {
        let ledger = self.ledger.as_ref();
        match method {
            "ledger_getUserRole" => {
                let address: Address = param(params, 0)?;
                to_value(ledger.get_role(&address).await?.to_string())
            }
            "ledger_getAdmins" => to_value(ledger.list_admins().await?),
            "ledger_getAdminDetails" => {
                to_value(ledger.get_admin_profile(&param(params, 0)?).await?)
            }
            "ledger_getPatientDetails" => {
                to_value(ledger.get_patient_profile(&param(params, 0)?).await?)
            }
            "ledger_getPatientRecords" => {
                to_value(ledger.list_record_ids_for_patient(&param(params, 0)?).await?)
            }
            "ledger_getAllRecords" => to_value(ledger.list_all_record_ids().await?),
            "ledger_getRecordMetadata" => {
                let record_id: RecordId = param(params, 0)?;
                to_value(ledger.get_record_metadata(record_id).await?)
            }
            "ledger_tokenURI" => to_value(ledger.get_content_locator(param(params, 0)?).await?),
            "ledger_ownerOf" => to_value(ledger.owner_of(param(params, 0)?).await?),
            "ledger_getMetrics" => to_value(ledger.get_metrics().await?),
            "ledger_mintRecord" => {
                let sender: Address = param(params, 0)?;
                let request = MintRequest {
                    content_id: ContentId::new(param::<String>(params, 1)?),
                    patient: param(params, 2)?,
                    document_name: param(params, 3)?,
                };
                let outcome = ledger.mint_record(&sender, &request).await;
                Ok(self.submit(outcome.map(Some)))
            }
            "ledger_addAdmin" => {
                let sender: Address = param(params, 0)?;
                let admin = NewAdmin {
                    address: param(params, 1)?,
                    name: param(params, 2)?,
                    institution: param(params, 3)?,
                    department: param(params, 4)?,
                    qualification: param(params, 5)?,
                };
                let outcome = ledger.register_admin(&sender, &admin).await;
                Ok(self.submit(outcome.map(|_| None)))
            }
            "ledger_addPatient" => {
                let sender: Address = param(params, 0)?;
                let patient = NewPatient {
                    address: param(params, 1)?,
                    name: param(params, 2)?,
                    age: param(params, 3)?,
                    phone_number: param(params, 4)?,
                };
                let outcome = ledger.register_patient(&sender, &patient).await;
                Ok(self.submit(outcome.map(|_| None)))
            }
            "ledger_getTransactionReceipt" => self.poll_receipt(&param::<String>(params, 0)?),
            other => Err(LedgerError::Rejected(format!("method not found: {other}"))),
        }
    }

    fn poll_receipt(&self, tx_hash: &str) -> Result<Value, LedgerError> {
        let mut receipts = self.receipts.lock();
        match receipts.get_mut(tx_hash) {
            Some(pending) if pending.polls_left > 0 => {
                pending.polls_left -= 1;
                Ok(Value::Null)
            }
            Some(pending) => Ok(pending.receipt.clone()),
            None => Err(LedgerError::Rejected(format!("unknown transaction {tx_hash}"))),
        }
    }

    /// Record a write's receipt and return its transaction hash.
    fn submit(&self, outcome: Result<Option<RecordId>, LedgerError>) -> Value {
        let receipt = match outcome {
            Ok(Some(record_id)) => json!({"status": "success", "recordId": record_id}),
            Ok(None) => json!({"status": "success"}),
            Err(LedgerError::Reverted { reason }) => json!({"status": "reverted", "reason": reason}),
            Err(other) => json!({"status": "reverted", "reason": other.to_string()}),
        };
        let polls_left = match *self.mode.lock() {
            ReceiptMode::Delayed(polls) => polls,
            ReceiptMode::Never | ReceiptMode::VanishAfterSubmit => usize::MAX,
        };

        let tx_hash = {
            let mut next = self.next_tx.lock();
            let hash = format!("0x{:064x}", *next);
            *next += 1;
            hash
        };
        self.receipts.lock().insert(
            tx_hash.clone(),
            PendingReceipt {
                polls_left,
                receipt,
            },
        );
        Value::String(tx_hash)
    }
}

struct PinningState {
    token: String,
    content_id: String,
    uploads: Mutex<Vec<usize>>,
}

/// Pinning-service stand-in: accepts `pinFileToIPFS` uploads carrying the
/// expected bearer token and answers with a fixed content id.
pub struct PinningStub {
    addr: SocketAddr,
    state: Arc<PinningState>,
    handle: JoinHandle<()>,
}

impl PinningStub {
    pub async fn start(token: &str, content_id: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind pinning stub");
        let addr = listener.local_addr().expect("stub addr");
        let state = Arc::new(PinningState {
            token: token.to_string(),
            content_id: content_id.to_string(),
            uploads: Mutex::new(Vec::new()),
        });

        let router = Router::new()
            .route("/pinning/pinFileToIPFS", post(pin_file))
            .with_state(Arc::clone(&state));
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn api_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Body sizes of accepted uploads.
    pub fn uploads(&self) -> Vec<usize> {
        self.state.uploads.lock().clone()
    }
}

impl Drop for PinningStub {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn pin_file(
    State(state): State<Arc<PinningState>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let expected = format!("Bearer {}", state.token);
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(expected.as_str());
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid token"})),
        );
    }

    state.uploads.lock().push(body.len());
    (
        StatusCode::OK,
        Json(json!({
            "IpfsHash": state.content_id,
            "PinSize": body.len(),
            "Timestamp": "2024-01-01T00:00:00Z"
        })),
    )
}
