//! # Registry Services
//!
//! Application services composing the outbound ports.
//!
//! None of them hold caller identity: the `Session` is passed explicitly to
//! every call that needs it.

mod directory;
mod finality;
mod metrics;
mod record_aggregator;
mod record_issuer;
mod registration;
mod role_resolver;

use std::sync::Arc;

pub use directory::DirectoryService;
pub use metrics::MetricsService;
pub use record_aggregator::RecordAggregator;
pub use record_issuer::RecordIssuer;
pub use registration::RegistrationService;
pub use role_resolver::RoleResolver;

use crate::config::RegistryConfig;
use crate::ports::{BlobStore, LedgerClient};

/// Every service wired to the same ledger and blob store.
pub struct RegistryServices<L: LedgerClient, B: BlobStore> {
    pub roles: RoleResolver<L>,
    pub issuer: RecordIssuer<L, B>,
    pub records: RecordAggregator<L, B>,
    pub metrics: MetricsService<L>,
    pub registration: RegistrationService<L>,
    pub directory: DirectoryService<L>,
}

impl<L: LedgerClient, B: BlobStore> RegistryServices<L, B> {
    pub fn new(ledger: Arc<L>, blobs: Arc<B>, config: &RegistryConfig) -> Self {
        Self {
            roles: RoleResolver::new(ledger.clone()),
            issuer: RecordIssuer::new(ledger.clone(), blobs.clone(), config),
            records: RecordAggregator::new(ledger.clone(), blobs, config),
            metrics: MetricsService::new(ledger.clone(), config),
            registration: RegistrationService::new(ledger.clone(), config),
            directory: DirectoryService::new(ledger),
        }
    }
}
