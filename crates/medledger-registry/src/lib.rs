//! # MedLedger Registry
//!
//! Record registry and retrieval core for ownership-tagged,
//! content-addressed medical documents.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Components
//!
//! | Service | Purpose |
//! |---------|---------|
//! | `RoleResolver` | Address to `Admin`/`Patient`/`Unregistered`, session login/logout |
//! | `RecordIssuer` | Two-phase issuance: stage bytes, then commit a mint |
//! | `RecordAggregator` | Bounded fan-out building `RecordView`s with partial-failure tolerance |
//! | `MetricsService` | Registry counts for display |
//! | `RegistrationService` | Privileged admin/patient registration |
//! | `DirectoryService` | Profile lookups and practitioner listing |
//!
//! ## Failure Model
//!
//! - No automatic retries anywhere in the core.
//! - A commit that fails after a successful stage leaves an orphan blob.
//! - A commit past its deadline is `OutcomeUnknown`; `RecordIssuer::reconcile`
//!   re-queries ownership before a retry.
//! - A fan-out returns successful views plus per-record failures.
//!
//! ## Module Structure
//!
//! ```text
//! medledger-registry/
//! ├── domain/      # Session, RecordView, RegistryError, validation
//! ├── ports/       # Inbound APIs + outbound LedgerClient/BlobStore/SessionStore
//! ├── adapters/    # JSON-RPC ledger, pinning service, in-memory, session files
//! ├── service/     # Application services
//! └── config.rs    # RegistryConfig
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    FileSessionStore, InMemoryBlobStore, InMemoryLedger, InMemorySessionStore, PinningBlobStore,
    RpcLedgerClient,
};
pub use config::{ConfigError, RegistryConfig};
pub use domain::{
    MetricsSnapshot, MintRequest, NewAdmin, NewPatient, PersistedSession, PractitionerEntry,
    RecordListing, RecordLookupFailure, RecordView, RegistryError, Session,
};
pub use ports::{
    BlobStore, BlobStoreError, LedgerClient, LedgerError, RecordIssuanceApi, RecordQueryApi,
    RoleResolutionApi, SessionStore, SessionStoreError,
};
pub use service::{
    DirectoryService, MetricsService, RecordAggregator, RecordIssuer, RegistrationService,
    RegistryServices, RoleResolver,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
