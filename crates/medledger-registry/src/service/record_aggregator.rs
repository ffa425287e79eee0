//! # Record Aggregator
//!
//! Scatter-gather over record ids: per record, metadata and content locator
//! are fetched concurrently, then the uploader's profile. At most
//! `fanout_concurrency` records are in flight; results keep ledger order.
//!
//! One record failing never aborts the others. Failures come back next to
//! the successful views in a `RecordListing`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use medledger_telemetry::{metric_inc, RECORD_LOOKUPS};
use shared_types::{Address, RecordId};
use tracing::{debug, warn};

use crate::config::RegistryConfig;
use crate::domain::{RecordListing, RecordLookupFailure, RecordView, RegistryError};
use crate::ports::{BlobStore, LedgerClient, LedgerError, RecordQueryApi};

/// Record retrieval service.
pub struct RecordAggregator<L: LedgerClient, B: BlobStore> {
    ledger: Arc<L>,
    blobs: Arc<B>,
    concurrency: usize,
    lookup_timeout: Duration,
}

impl<L: LedgerClient, B: BlobStore> RecordAggregator<L, B> {
    pub fn new(ledger: Arc<L>, blobs: Arc<B>, config: &RegistryConfig) -> Self {
        Self {
            ledger,
            blobs,
            concurrency: config.fanout_concurrency.max(1),
            lookup_timeout: config.lookup_timeout(),
        }
    }

    /// Views for an explicit set of record ids, e.g. the failed subset of
    /// an earlier listing. Owners are read from the ledger.
    pub async fn fetch_records(&self, record_ids: &[RecordId]) -> RecordListing {
        self.gather(record_ids, None).await
    }

    async fn gather(&self, record_ids: &[RecordId], owner: Option<Address>) -> RecordListing {
        let results: Vec<(RecordId, Result<RecordView, RegistryError>)> =
            stream::iter(record_ids.iter().copied())
                .map(move |record_id| async move { (record_id, self.lookup(record_id, owner).await) })
                .buffered(self.concurrency)
                .collect()
                .await;

        let mut listing = RecordListing::default();
        for (record_id, result) in results {
            match result {
                Ok(view) => {
                    metric_inc!(RECORD_LOOKUPS, &["success"]);
                    listing.views.push(view);
                }
                Err(cause) => {
                    metric_inc!(RECORD_LOOKUPS, &["failure"]);
                    warn!(record_id, error = %cause, "Record lookup failed");
                    listing
                        .failures
                        .push(RecordLookupFailure { record_id, cause });
                }
            }
        }

        debug!(
            requested = record_ids.len(),
            resolved = listing.views.len(),
            failed = listing.failures.len(),
            "Fan-out complete"
        );
        listing
    }

    async fn lookup(
        &self,
        record_id: RecordId,
        owner: Option<Address>,
    ) -> Result<RecordView, RegistryError> {
        let owner_lookup = async {
            match owner {
                Some(owner) => Ok(owner),
                None => self.read("ownerOf", self.ledger.owner_of(record_id)).await,
            }
        };

        let (metadata, content_id, owner) = tokio::try_join!(
            self.read("getRecordMetadata", self.ledger.get_record_metadata(record_id)),
            self.read("tokenURI", self.ledger.get_content_locator(record_id)),
            owner_lookup,
        )?;

        let uploader = self
            .read(
                "getAdminDetails",
                self.ledger.get_admin_profile(&metadata.uploader),
            )
            .await?;

        let locator = self.blobs.locator_for(&content_id);
        Ok(RecordView {
            record_id,
            content_id,
            document_name: metadata.document_name,
            mint_timestamp: metadata.mint_timestamp,
            owner,
            uploader,
            locator,
        })
    }

    async fn read<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T, LedgerError>>,
    ) -> Result<T, RegistryError> {
        match tokio::time::timeout(self.lookup_timeout, call).await {
            Ok(result) => result.map_err(RegistryError::from),
            Err(_) => Err(LedgerError::Timeout {
                operation: operation.to_string(),
            }
            .into()),
        }
    }
}

#[async_trait]
impl<L, B> RecordQueryApi for RecordAggregator<L, B>
where
    L: LedgerClient,
    B: BlobStore,
{
    async fn list_for_patient(&self, patient: &Address) -> Result<RecordListing, RegistryError> {
        let record_ids = self
            .read(
                "getPatientRecords",
                self.ledger.list_record_ids_for_patient(patient),
            )
            .await?;
        if record_ids.is_empty() {
            return Err(RegistryError::NotFound(format!(
                "no records for patient {patient}"
            )));
        }
        debug!(patient = %patient, count = record_ids.len(), "Listing patient records");
        Ok(self.gather(&record_ids, Some(*patient)).await)
    }

    async fn list_all(&self) -> Result<RecordListing, RegistryError> {
        let record_ids = self
            .read("getAllRecords", self.ledger.list_all_record_ids())
            .await?;
        if record_ids.is_empty() {
            return Err(RegistryError::NotFound(
                "no records on the ledger".to_string(),
            ));
        }
        Ok(self.gather(&record_ids, None).await)
    }
}
