//! # Domain Entities
//!
//! Session context, derived record views and registration inputs.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{AdminProfile, Address, ContentId, LedgerMetrics, RecordId, Role};

use super::errors::RegistryError;

// =============================================================================
// SESSION
// =============================================================================

/// Explicit per-identity session context.
///
/// Passed to every service that needs the caller's identity instead of
/// living in process-wide state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    account: Option<Address>,
    role: Option<Role>,
}

impl Session {
    /// Session backed by a connected account whose role is not yet resolved.
    pub fn connect(account: Address) -> Self {
        Self {
            account: Some(account),
            role: None,
        }
    }

    /// Session without a connected account.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Restore a session from its persisted form.
    pub fn restore(persisted: &PersistedSession) -> Self {
        Self {
            account: Some(persisted.account),
            role: Some(persisted.role),
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Connected account, or `Connectivity` if none.
    pub fn require_account(&self) -> Result<Address, RegistryError> {
        self.account.ok_or_else(|| {
            RegistryError::Connectivity("no connected account in session".to_string())
        })
    }

    pub(crate) fn set_role(&mut self, role: Role) {
        self.role = Some(role);
    }

    /// Drop the account and role.
    pub fn clear(&mut self) {
        self.account = None;
        self.role = None;
    }

    /// Persistable form, available once the role has been resolved.
    pub fn to_persisted(&self) -> Option<PersistedSession> {
        match (self.account, self.role) {
            (Some(account), Some(role)) => Some(PersistedSession { account, role }),
            _ => None,
        }
    }
}

/// The single key-value entry a host persists between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub account: Address,
    pub role: Role,
}

// =============================================================================
// RECORD VIEWS
// =============================================================================

/// A record joined with its uploader's profile and a resolved locator.
///
/// Built on demand; never cached across calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordView {
    pub record_id: RecordId,
    pub content_id: ContentId,
    pub document_name: String,
    pub mint_timestamp: u64,
    pub owner: Address,
    pub uploader: AdminProfile,
    /// Gateway URL for the underlying document.
    pub locator: String,
}

impl RecordView {
    /// Mint time as a UTC timestamp, if representable.
    pub fn minted_at_utc(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.mint_timestamp).ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }
}

/// One record whose lookup failed during a fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLookupFailure {
    pub record_id: RecordId,
    pub cause: RegistryError,
}

/// Result of a fan-out: the successful views in ledger order plus the
/// per-record failures.
///
/// A non-empty `failures` list is the partial-failure case; retrying just
/// those ids is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordListing {
    pub views: Vec<RecordView>,
    pub failures: Vec<RecordLookupFailure>,
}

impl RecordListing {
    /// Whether at least one lookup failed.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Ids of the records that failed, in ledger order.
    pub fn failed_ids(&self) -> Vec<RecordId> {
        self.failures.iter().map(|f| f.record_id).collect()
    }

    /// Find a view by id.
    pub fn get(&self, record_id: RecordId) -> Option<&RecordView> {
        self.views.iter().find(|v| v.record_id == record_id)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

// =============================================================================
// METRICS
// =============================================================================

/// Fixed offsets the legacy dashboard added to every count.
pub const LEGACY_ADMIN_OFFSET: u64 = 20;
pub const LEGACY_PATIENT_OFFSET: u64 = 92;
pub const LEGACY_RECORD_OFFSET: u64 = 175;

/// Display snapshot of registry counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub total_admins: u64,
    pub total_patients: u64,
    pub total_records: u64,
}

impl MetricsSnapshot {
    /// Raw ledger counts.
    pub fn from_ledger(metrics: LedgerMetrics) -> Self {
        Self {
            total_admins: metrics.total_admins,
            total_patients: metrics.total_patients,
            total_records: metrics.total_records,
        }
    }

    /// Counts as the legacy dashboard displayed them.
    pub fn with_legacy_offsets(self) -> Self {
        Self {
            total_admins: self.total_admins.saturating_add(LEGACY_ADMIN_OFFSET),
            total_patients: self.total_patients.saturating_add(LEGACY_PATIENT_OFFSET),
            total_records: self.total_records.saturating_add(LEGACY_RECORD_OFFSET),
        }
    }
}

// =============================================================================
// WRITE INPUTS
// =============================================================================

/// Arguments of a mint transaction. The uploader is the submitting account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MintRequest {
    pub content_id: ContentId,
    pub patient: Address,
    pub document_name: String,
}

/// Registration input for a new issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAdmin {
    pub address: Address,
    pub name: String,
    pub institution: String,
    pub department: String,
    pub qualification: String,
}

/// Registration input for a new subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPatient {
    pub address: Address,
    pub name: String,
    pub age: u32,
    pub phone_number: String,
}

// =============================================================================
// DIRECTORY
// =============================================================================

/// Practitioner listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PractitionerEntry {
    pub profile: AdminProfile,
    /// Decorative rating in `3..=4`, stable per admin.
    pub display_rating: u8,
}
