//! JSON-RPC 2.0 transport shared by the ledger gateway adapter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use medledger_telemetry::LEDGER_CALL_DURATION;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ports::LedgerError;

/// JSON-RPC error code the ledger gateway uses for reverted calls.
pub const REVERT_ERROR_CODE: i32 = 3;

/// JSON-RPC request structure
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<T> {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: T,
    pub id: u64,
}

impl<T> JsonRpcRequest<T> {
    pub fn new(method: impl Into<String>, params: T, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC response structure
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    #[allow(dead_code)]
    pub jsonrpc: String,
    #[allow(dead_code)]
    pub id: u64,
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC Error {}: {}", self.code, self.message)
    }
}

/// Map a gateway error object onto the ledger error taxonomy.
///
/// Reverts keep the contract's reason string: taken from `data` when it is
/// a string, otherwise from the message with the revert prefix removed.
pub fn classify_rpc_error(error: JsonRpcError) -> LedgerError {
    let is_revert =
        error.code == REVERT_ERROR_CODE || error.message.to_lowercase().contains("revert");
    if !is_revert {
        return LedgerError::Rejected(error.to_string());
    }

    let from_data = error
        .data
        .as_ref()
        .and_then(|d| d.as_str())
        .map(str::to_string);
    let reason = from_data.or_else(|| {
        let stripped = error
            .message
            .trim_start_matches("execution reverted")
            .trim_start_matches(':')
            .trim();
        (!stripped.is_empty()).then(|| stripped.to_string())
    });
    LedgerError::Reverted { reason }
}

/// Thin JSON-RPC client over HTTP.
pub struct JsonRpcTransport {
    client: Client,
    endpoint: String,
    request_id: AtomicU64,
}

impl JsonRpcTransport {
    pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            request_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Call a method that always yields a result.
    pub async fn call<P, R>(&self, method: &str, params: P) -> Result<R, LedgerError>
    where
        P: Serialize + Send,
        R: serde::de::DeserializeOwned,
    {
        self.call_optional(method, params)
            .await?
            .ok_or_else(|| LedgerError::Rejected(format!("{method}: missing result in response")))
    }

    /// Call a method whose result may legitimately be `null`.
    pub async fn call_optional<P, R>(&self, method: &str, params: P) -> Result<Option<R>, LedgerError>
    where
        P: Serialize + Send,
        R: serde::de::DeserializeOwned,
    {
        let _timer = LEDGER_CALL_DURATION
            .with_label_values(&[method])
            .start_timer();
        let request = JsonRpcRequest::new(method, params, self.next_id());
        debug!(method, id = request.id, "ledger rpc call");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LedgerError::Timeout {
                        operation: method.to_string(),
                    }
                } else if e.is_connect() {
                    LedgerError::Transport(format!("Cannot connect to {}", self.endpoint))
                } else {
                    LedgerError::Transport(e.to_string())
                }
            })?;

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| LedgerError::Rejected(format!("{method}: failed to parse response: {e}")))?;

        if let Some(error) = rpc_response.error {
            return Err(classify_rpc_error(error));
        }
        Ok(rpc_response.result)
    }
}
