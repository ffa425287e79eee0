//! # Inbound Ports
//!
//! APIs the registry core exposes to its callers (UI layer, CLI).

use async_trait::async_trait;
use shared_types::{Address, ContentId, RecordId, Role};

use crate::domain::{RecordListing, RegistryError, Session};

/// Role resolution API.
#[async_trait]
pub trait RoleResolutionApi: Send + Sync {
    /// Role of `address`. Pure read; idempotent.
    async fn resolve(&self, session: &Session, address: &Address) -> Result<Role, RegistryError>;
}

/// Two-phase record issuance API.
///
/// `stage` touches only the blob store; `commit` touches only the ledger.
#[async_trait]
pub trait RecordIssuanceApi: Send + Sync {
    /// Phase 1: validate inputs and upload bytes. No ledger state changes.
    async fn stage(
        &self,
        file: Vec<u8>,
        patient_address: &str,
        document_name: &str,
    ) -> Result<ContentId, RegistryError>;

    /// Phase 2: mint a record binding `content_id` to `patient`, uploaded
    /// by the session account.
    async fn commit(
        &self,
        session: &Session,
        content_id: &ContentId,
        patient: &Address,
        document_name: &str,
    ) -> Result<RecordId, RegistryError>;
}

/// Record retrieval API.
#[async_trait]
pub trait RecordQueryApi: Send + Sync {
    /// Views of every record owned by `patient`.
    ///
    /// `Err(NotFound)` when the patient owns nothing.
    async fn list_for_patient(&self, patient: &Address) -> Result<RecordListing, RegistryError>;

    /// Views of every record on the ledger (admin view).
    async fn list_all(&self) -> Result<RecordListing, RegistryError>;
}
