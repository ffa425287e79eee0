//! # Record Issuer
//!
//! Two-phase issuance: `stage` uploads the document to the blob store,
//! `commit` mints the ledger record that binds it to a patient.
//!
//! The phases are never chained implicitly. A commit that fails after a
//! successful stage leaves an unreferenced blob behind; it is not deleted,
//! since the same content may be committed again later.
//!
//! A commit that does not reach finality within the mint deadline, or whose
//! receipt is lost after submission, returns `OutcomeUnknown`. Call
//! `reconcile` with the same document name before retrying it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use medledger_telemetry::{metric_inc, BLOBS_STAGED, COMMIT_FAILURES, RECORDS_COMMITTED};
use shared_types::{Address, ContentId, RecordId};
use tracing::{debug, info, warn};

use super::finality::bounded_write;

use crate::config::RegistryConfig;
use crate::domain::{
    check_document_size, parse_address, require_text, MintRequest, RegistryError, Session,
};
use crate::ports::{BlobStore, LedgerClient, LedgerError, RecordIssuanceApi};

const MINT_OPERATION: &str = "mintRecord";

/// Record issuance service.
pub struct RecordIssuer<L: LedgerClient, B: BlobStore> {
    ledger: Arc<L>,
    blobs: Arc<B>,
    max_document_bytes: usize,
    mint_timeout: Duration,
    lookup_timeout: Duration,
}

impl<L: LedgerClient, B: BlobStore> RecordIssuer<L, B> {
    pub fn new(ledger: Arc<L>, blobs: Arc<B>, config: &RegistryConfig) -> Self {
        Self {
            ledger,
            blobs,
            max_document_bytes: config.max_document_bytes,
            mint_timeout: config.mint_timeout(),
            lookup_timeout: config.lookup_timeout(),
        }
    }

    /// Look for a record already binding `content_id` to `patient` under
    /// `document_name`.
    ///
    /// Used after `OutcomeUnknown` to learn whether the mint landed. Scans the
    /// patient's records newest first.
    pub async fn reconcile(
        &self,
        content_id: &ContentId,
        patient: &Address,
        document_name: &str,
    ) -> Result<Option<RecordId>, RegistryError> {
        let record_ids = self
            .read("getPatientRecords", self.ledger.list_record_ids_for_patient(patient))
            .await?;

        for record_id in record_ids.into_iter().rev() {
            let locator = self
                .read("tokenURI", self.ledger.get_content_locator(record_id))
                .await?;
            if &locator != content_id {
                continue;
            }
            let metadata = self
                .read("getRecordMetadata", self.ledger.get_record_metadata(record_id))
                .await?;
            if metadata.document_name == document_name {
                info!(record_id, patient = %patient, "Reconciled pending mint");
                return Ok(Some(record_id));
            }
        }

        debug!(patient = %patient, content_id = %content_id, "No matching record");
        Ok(None)
    }

    async fn read<T>(
        &self,
        operation: &str,
        call: impl std::future::Future<Output = Result<T, LedgerError>>,
    ) -> Result<T, RegistryError> {
        match tokio::time::timeout(self.lookup_timeout, call).await {
            Ok(result) => result.map_err(RegistryError::from),
            Err(_) => Err(LedgerError::Timeout {
                operation: operation.to_string(),
            }
            .into()),
        }
    }

    fn record_failure(err: RegistryError) -> RegistryError {
        metric_inc!(COMMIT_FAILURES, &[err.kind()]);
        err
    }
}

#[async_trait]
impl<L, B> RecordIssuanceApi for RecordIssuer<L, B>
where
    L: LedgerClient,
    B: BlobStore,
{
    async fn stage(
        &self,
        file: Vec<u8>,
        patient_address: &str,
        document_name: &str,
    ) -> Result<ContentId, RegistryError> {
        let patient = parse_address("patient address", patient_address)?;
        require_text("document name", document_name)?;
        check_document_size(file.len(), self.max_document_bytes)?;

        let size = file.len();
        let content_id = self.blobs.put(file).await?;
        metric_inc!(BLOBS_STAGED);

        info!(
            content_id = %content_id,
            patient = %patient,
            bytes = size,
            "Document staged"
        );
        Ok(content_id)
    }

    async fn commit(
        &self,
        session: &Session,
        content_id: &ContentId,
        patient: &Address,
        document_name: &str,
    ) -> Result<RecordId, RegistryError> {
        let sender = session.require_account()?;
        if content_id.is_empty() {
            return Err(RegistryError::Validation(
                "content id is required".to_string(),
            ));
        }
        require_text("document name", document_name)?;

        let request = MintRequest {
            content_id: content_id.clone(),
            patient: *patient,
            document_name: document_name.to_string(),
        };

        let record_id = bounded_write(
            MINT_OPERATION,
            self.mint_timeout,
            self.ledger.mint_record(&sender, &request),
        )
        .await
        .map_err(|err| {
            if !err.is_outcome_unknown() {
                warn!(patient = %patient, error = %err, "Commit failed");
            }
            Self::record_failure(err)
        })?;

        metric_inc!(RECORDS_COMMITTED);
        info!(
            record_id,
            patient = %patient,
            uploader = %sender,
            content_id = %content_id,
            "Record committed"
        );
        Ok(record_id)
    }
}
