//! # Domain Errors
//!
//! Error taxonomy surfaced to callers of the registry core.
//!
//! Every error is returned as a typed result. The core performs no
//! automatic retries: retrying a reverted mint reverts again, and retrying
//! an unconfirmed mint may double-issue.

use thiserror::Error;

use crate::ports::{BlobStoreError, LedgerError, SessionStoreError};

/// Errors returned by registry services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No connected account or the transport to a service is down.
    /// Recoverable by reconnecting; never retried automatically.
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Malformed input. No ledger call was attempted.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The ledger reverted a transaction or rejected a read.
    #[error("Ledger error: {}", reason.as_deref().unwrap_or("call rejected without reason"))]
    Ledger {
        /// Ledger-reported reason, when one was given.
        reason: Option<String>,
    },

    /// A well-formed query matched nothing. Callers render an empty state.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A submitted transaction was not confirmed before the caller's
    /// deadline. It may still land; re-query ownership before retrying.
    #[error("Outcome unknown for {operation}: transaction may still be finalized")]
    OutcomeUnknown {
        /// Operation whose outcome is unknown.
        operation: String,
    },

    /// The blob store accepted the connection but refused or mangled the upload.
    #[error("Blob store error: {0}")]
    BlobStore(String),

    /// The persisted session could not be read or written.
    #[error("Session error: {0}")]
    Session(String),
}

impl RegistryError {
    /// Ledger error carrying a reason string.
    pub fn ledger(reason: impl Into<String>) -> Self {
        Self::Ledger {
            reason: Some(reason.into()),
        }
    }

    /// Whether this is the empty-result case rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether the failed operation may nonetheless have taken effect.
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(self, Self::OutcomeUnknown { .. })
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connectivity(_) => "connectivity",
            Self::Validation(_) => "validation",
            Self::Ledger { .. } => "ledger",
            Self::NotFound(_) => "not_found",
            Self::OutcomeUnknown { .. } => "outcome_unknown",
            Self::BlobStore(_) => "blob_store",
            Self::Session(_) => "session",
        }
    }
}

impl From<LedgerError> for RegistryError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Transport(message) => Self::Connectivity(message),
            LedgerError::Reverted { reason } => Self::Ledger { reason },
            LedgerError::Rejected(message) => Self::Ledger {
                reason: Some(message),
            },
            LedgerError::Timeout { operation } => Self::Ledger {
                reason: Some(format!("{operation} timed out")),
            },
            LedgerError::Unconfirmed { tx_hash, .. } => Self::OutcomeUnknown {
                operation: format!("transaction {tx_hash}"),
            },
        }
    }
}

impl From<BlobStoreError> for RegistryError {
    fn from(err: BlobStoreError) -> Self {
        match err {
            BlobStoreError::Transport(message) => Self::Connectivity(message),
            other => Self::BlobStore(other.to_string()),
        }
    }
}

impl From<SessionStoreError> for RegistryError {
    fn from(err: SessionStoreError) -> Self {
        Self::Session(err.to_string())
    }
}
