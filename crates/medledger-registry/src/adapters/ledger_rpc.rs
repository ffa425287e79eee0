//! Ledger Gateway Adapter
//!
//! Implements the `LedgerClient` port against a JSON-RPC ledger gateway.
//! Writes return a transaction hash which is then polled until the gateway
//! reports a final receipt.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use shared_types::{
    AdminProfile, Address, ContentId, LedgerMetrics, PatientProfile, RecordId, RecordMetadata,
    Role, TxHash,
};
use tracing::{debug, info, warn};

use super::json_rpc::JsonRpcTransport;
use crate::config::RegistryConfig;
use crate::domain::{MintRequest, NewAdmin, NewPatient};
use crate::ports::{LedgerClient, LedgerError};

/// Final status of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// Receipt reported once a transaction is final.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub status: ReceiptStatus,
    #[serde(default)]
    pub record_id: Option<RecordId>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl TransactionReceipt {
    fn into_result(self) -> Result<Self, LedgerError> {
        match self.status {
            ReceiptStatus::Success => Ok(self),
            ReceiptStatus::Reverted => Err(LedgerError::Reverted {
                reason: self.reason,
            }),
        }
    }
}

/// JSON-RPC ledger gateway client.
pub struct RpcLedgerClient {
    transport: JsonRpcTransport,
    poll_interval: Duration,
}

impl RpcLedgerClient {
    pub fn new(
        endpoint: impl Into<String>,
        request_timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self, LedgerError> {
        Ok(Self {
            transport: JsonRpcTransport::new(endpoint, request_timeout)?,
            poll_interval,
        })
    }

    /// Build from registry configuration.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, LedgerError> {
        Self::new(
            config.ledger_endpoint.clone(),
            config.lookup_timeout(),
            config.receipt_poll_interval(),
        )
    }

    /// Poll for a receipt until one is reported.
    ///
    /// There is no deadline here; the caller bounds the wait. A dropped
    /// wait leaves the transaction pending, not failed.
    async fn await_receipt(&self, tx_hash: &TxHash) -> Result<TransactionReceipt, LedgerError> {
        loop {
            let receipt: Option<TransactionReceipt> = self
                .transport
                .call_optional("ledger_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if let Some(receipt) = receipt {
                debug!(tx_hash = %tx_hash, status = ?receipt.status, "receipt final");
                return receipt.into_result();
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn submit(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<TransactionReceipt, LedgerError> {
        let tx_hash: TxHash = self.transport.call(method, params).await?;
        info!(method, tx_hash = %tx_hash, "transaction submitted");
        match self.await_receipt(&tx_hash).await {
            Err(err @ LedgerError::Reverted { .. }) => Err(err),
            Err(err) => {
                warn!(method, tx_hash = %tx_hash, error = %err, "receipt unavailable after submit");
                Err(LedgerError::Unconfirmed {
                    tx_hash,
                    cause: err.to_string(),
                })
            }
            Ok(receipt) => Ok(receipt),
        }
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn get_role(&self, address: &Address) -> Result<Role, LedgerError> {
        let raw: String = self
            .transport
            .call("ledger_getUserRole", json!([address]))
            .await?;
        raw.parse().map_err(LedgerError::Rejected)
    }

    async fn list_admins(&self) -> Result<Vec<AdminProfile>, LedgerError> {
        self.transport.call("ledger_getAdmins", json!([])).await
    }

    async fn get_admin_profile(&self, address: &Address) -> Result<AdminProfile, LedgerError> {
        self.transport
            .call("ledger_getAdminDetails", json!([address]))
            .await
    }

    async fn get_patient_profile(
        &self,
        address: &Address,
    ) -> Result<PatientProfile, LedgerError> {
        self.transport
            .call("ledger_getPatientDetails", json!([address]))
            .await
    }

    async fn list_record_ids_for_patient(
        &self,
        address: &Address,
    ) -> Result<Vec<RecordId>, LedgerError> {
        self.transport
            .call("ledger_getPatientRecords", json!([address]))
            .await
    }

    async fn list_all_record_ids(&self) -> Result<Vec<RecordId>, LedgerError> {
        self.transport.call("ledger_getAllRecords", json!([])).await
    }

    async fn get_record_metadata(
        &self,
        record_id: RecordId,
    ) -> Result<RecordMetadata, LedgerError> {
        self.transport
            .call("ledger_getRecordMetadata", json!([record_id]))
            .await
    }

    async fn get_content_locator(&self, record_id: RecordId) -> Result<ContentId, LedgerError> {
        self.transport
            .call("ledger_tokenURI", json!([record_id]))
            .await
    }

    async fn owner_of(&self, record_id: RecordId) -> Result<Address, LedgerError> {
        self.transport.call("ledger_ownerOf", json!([record_id])).await
    }

    async fn mint_record(
        &self,
        sender: &Address,
        request: &MintRequest,
    ) -> Result<RecordId, LedgerError> {
        let receipt = self
            .submit(
                "ledger_mintRecord",
                json!([
                    sender,
                    request.content_id,
                    request.patient,
                    request.document_name
                ]),
            )
            .await?;
        receipt.record_id.ok_or_else(|| {
            LedgerError::Rejected("mint receipt did not report a record id".to_string())
        })
    }

    async fn register_admin(&self, sender: &Address, admin: &NewAdmin) -> Result<(), LedgerError> {
        self.submit(
            "ledger_addAdmin",
            json!([
                sender,
                admin.address,
                admin.name,
                admin.institution,
                admin.department,
                admin.qualification
            ]),
        )
        .await
        .map(|_| ())
    }

    async fn register_patient(
        &self,
        sender: &Address,
        patient: &NewPatient,
    ) -> Result<(), LedgerError> {
        self.submit(
            "ledger_addPatient",
            json!([
                sender,
                patient.address,
                patient.name,
                patient.age,
                patient.phone_number
            ]),
        )
        .await
        .map(|_| ())
    }

    async fn get_metrics(&self) -> Result<LedgerMetrics, LedgerError> {
        self.transport.call("ledger_getMetrics", json!([])).await
    }
}
