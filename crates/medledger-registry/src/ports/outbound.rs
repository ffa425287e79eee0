//! # Outbound Ports
//!
//! Traits for the external services the core depends on: the ledger, the
//! content-addressable blob store and the host's session persistence.

use async_trait::async_trait;
use shared_types::{
    AdminProfile, Address, ContentId, LedgerMetrics, PatientProfile, RecordId, RecordMetadata, Role,
    TxHash,
};
use thiserror::Error;

use crate::domain::{MintRequest, NewAdmin, NewPatient, PersistedSession};

/// Ledger service - outbound port.
///
/// Reads are plain round-trips. Writes take the submitting account as
/// `sender` and resolve only once the ledger reports finality.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Role of an account.
    async fn get_role(&self, address: &Address) -> Result<Role, LedgerError>;

    /// Every registered admin, in registration order.
    async fn list_admins(&self) -> Result<Vec<AdminProfile>, LedgerError>;

    /// Keyed admin lookup.
    async fn get_admin_profile(&self, address: &Address) -> Result<AdminProfile, LedgerError>;

    /// Keyed patient lookup.
    async fn get_patient_profile(&self, address: &Address)
        -> Result<PatientProfile, LedgerError>;

    /// Record ids owned by a patient, in ledger order.
    async fn list_record_ids_for_patient(
        &self,
        address: &Address,
    ) -> Result<Vec<RecordId>, LedgerError>;

    /// Every record id, in ledger order.
    async fn list_all_record_ids(&self) -> Result<Vec<RecordId>, LedgerError>;

    /// Document name, mint time and uploader of a record.
    async fn get_record_metadata(&self, record_id: RecordId)
        -> Result<RecordMetadata, LedgerError>;

    /// Content id bound to a record.
    async fn get_content_locator(&self, record_id: RecordId) -> Result<ContentId, LedgerError>;

    /// Current owner of a record.
    async fn owner_of(&self, record_id: RecordId) -> Result<Address, LedgerError>;

    /// Mint a record. `sender` must be a registered admin.
    ///
    /// Once the write has been submitted, any failure short of a reverted
    /// receipt is reported as `Unconfirmed`.
    async fn mint_record(
        &self,
        sender: &Address,
        request: &MintRequest,
    ) -> Result<RecordId, LedgerError>;

    /// Register an admin (privileged).
    async fn register_admin(&self, sender: &Address, admin: &NewAdmin) -> Result<(), LedgerError>;

    /// Register a patient (privileged).
    async fn register_patient(
        &self,
        sender: &Address,
        patient: &NewPatient,
    ) -> Result<(), LedgerError>;

    /// Registry-wide counts.
    async fn get_metrics(&self) -> Result<LedgerMetrics, LedgerError>;
}

/// Content-addressable blob store - outbound port.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return their content id.
    async fn put(&self, bytes: Vec<u8>) -> Result<ContentId, BlobStoreError>;

    /// Gateway URL for a content id. Pure function of `content_id`.
    fn locator_for(&self, content_id: &ContentId) -> String;
}

/// Host persistence for the resolved session (single entry).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Previously saved session, if any.
    async fn load(&self) -> Result<Option<PersistedSession>, SessionStoreError>;

    /// Replace the saved session.
    async fn save(&self, session: &PersistedSession) -> Result<(), SessionStoreError>;

    /// Remove the saved session.
    async fn clear(&self) -> Result<(), SessionStoreError>;
}

/// Gateway URL pattern `{base}/{content_id}`.
pub fn gateway_locator(base: &str, content_id: &ContentId) -> String {
    format!("{}/{}", base.trim_end_matches('/'), content_id)
}

/// Ledger communication errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Transaction reverted.
    #[error("Transaction reverted: {}", reason.as_deref().unwrap_or("no reason given"))]
    Reverted { reason: Option<String> },

    /// Read call rejected by the ledger.
    #[error("Call rejected: {0}")]
    Rejected(String),

    /// No answer before the deadline.
    #[error("Ledger call timed out: {operation}")]
    Timeout { operation: String },

    /// A write was accepted but no final receipt was obtained. It may
    /// still land.
    #[error("Transaction {tx_hash} submitted but not confirmed: {cause}")]
    Unconfirmed { tx_hash: TxHash, cause: String },

    /// Ledger endpoint unreachable.
    #[error("Ledger transport error: {0}")]
    Transport(String),
}

/// Blob store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobStoreError {
    /// The service refused the upload.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// The service is unreachable.
    #[error("Blob store transport error: {0}")]
    Transport(String),

    /// The service answered with something other than a content id.
    #[error("Invalid blob store response: {0}")]
    InvalidResponse(String),
}

/// Session persistence errors.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("Session I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
