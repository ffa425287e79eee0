//! # Metrics Snapshot
//!
//! Registry-wide counts for display. Raw ledger counts unless the legacy
//! offsets are switched on in configuration.

use std::sync::Arc;

use tracing::debug;

use crate::config::RegistryConfig;
use crate::domain::{MetricsSnapshot, RegistryError};
use crate::ports::LedgerClient;

/// Display metrics service.
pub struct MetricsService<L: LedgerClient> {
    ledger: Arc<L>,
    legacy_offsets: bool,
}

impl<L: LedgerClient> MetricsService<L> {
    pub fn new(ledger: Arc<L>, config: &RegistryConfig) -> Self {
        Self {
            ledger,
            legacy_offsets: config.legacy_metric_offsets,
        }
    }

    /// One ledger round-trip.
    pub async fn snapshot(&self) -> Result<MetricsSnapshot, RegistryError> {
        let counts = self.ledger.get_metrics().await?;
        let snapshot = MetricsSnapshot::from_ledger(counts);
        debug!(
            admins = snapshot.total_admins,
            patients = snapshot.total_patients,
            records = snapshot.total_records,
            legacy_offsets = self.legacy_offsets,
            "Metrics snapshot"
        );
        Ok(if self.legacy_offsets {
            snapshot.with_legacy_offsets()
        } else {
            snapshot
        })
    }
}
