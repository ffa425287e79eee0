//! # Core Domain Entities
//!
//! Defines the registry entities shared by every MedLedger crate.
//!
//! ## Clusters
//!
//! - **Identity**: `Address`, `Role`
//! - **Profiles**: `AdminProfile`, `PatientProfile`
//! - **Records**: `Record`, `RecordMetadata`, `ContentId`, `RecordId`
//! - **Ledger**: `LedgerMetrics`, `TxHash`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::AddressParseError;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Ledger-assigned record identifier. Unique, never reused.
pub type RecordId = u64;

/// Transaction hash as reported by the ledger gateway (0x-prefixed hex).
pub type TxHash = String;

/// A 20-byte account handle.
///
/// Parsed from and rendered as `0x`-prefixed hex. Parsing accepts any
/// letter case, so two addresses compare equal whenever their hex forms
/// match case-insensitively.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Byte length of an address.
    pub const LEN: usize = 20;

    /// Wrap raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or(AddressParseError::MissingPrefix)?;

        if digits.len() != Self::LEN * 2 {
            return Err(AddressParseError::InvalidLength {
                got: digits.len(),
                expected: Self::LEN * 2,
            });
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Role of an account as reported by the ledger.
///
/// Derived per session; the ledger is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Record issuer.
    Admin,
    /// Record subject.
    Patient,
    /// Known to neither the admin nor the patient registry.
    Unregistered,
}

impl Role {
    /// Whether the role is backed by a ledger profile.
    pub fn is_registered(&self) -> bool {
        !matches!(self, Role::Unregistered)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Admin => "Admin",
            Role::Patient => "Patient",
            Role::Unregistered => "Unregistered",
        };
        f.write_str(label)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim() {
            "Admin" | "admin" => Ok(Role::Admin),
            "Patient" | "patient" => Ok(Role::Patient),
            "Unregistered" | "unregistered" | "" => Ok(Role::Unregistered),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

// =============================================================================
// CLUSTER B: PROFILES
// =============================================================================

/// Issuer profile. Immutable after registration except
/// `total_records_issued`, which the ledger bumps on each mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub admin_id: u64,
    #[serde(alias = "adminAddress")]
    pub address: Address,
    pub name: String,
    pub institution: String,
    pub department: String,
    pub qualification: String,
    #[serde(alias = "totalRecords")]
    pub total_records_issued: u64,
}

/// Subject profile. Immutable after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub patient_id: u64,
    #[serde(alias = "patientAddress")]
    pub address: Address,
    pub name: String,
    pub age: u32,
    pub phone_number: String,
}

// =============================================================================
// CLUSTER C: RECORDS
// =============================================================================

/// Content-derived identifier of a stored blob.
///
/// Identical bytes yield an identical id, so staging the same document
/// twice is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Wrap an id reported by a blob store. Surrounding whitespace is dropped.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self(raw.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Per-record metadata as returned by the ledger's metadata read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    pub document_name: String,
    /// Seconds since the Unix epoch.
    pub mint_timestamp: u64,
    #[serde(alias = "adminUploaderAddress", alias = "uploaderAddress")]
    pub uploader: Address,
}

/// A minted record. Created once by a successful mint; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub record_id: RecordId,
    pub content_id: ContentId,
    pub document_name: String,
    pub mint_timestamp: u64,
    pub uploader: Address,
    pub owner: Address,
}

impl Record {
    /// Metadata projection of this record.
    pub fn metadata(&self) -> RecordMetadata {
        RecordMetadata {
            document_name: self.document_name.clone(),
            mint_timestamp: self.mint_timestamp,
            uploader: self.uploader,
        }
    }
}

// =============================================================================
// CLUSTER D: LEDGER
// =============================================================================

/// Registry-wide counts reported by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerMetrics {
    pub total_admins: u64,
    pub total_patients: u64,
    pub total_records: u64,
}
