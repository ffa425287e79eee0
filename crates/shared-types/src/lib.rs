//! # Shared Types Crate
//!
//! Domain entities shared across the MedLedger workspace: account
//! addresses, roles, issuer/subject profiles and minted records.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every cross-crate entity is defined here.
//! - **Ledger Wire Compatibility**: entities deserialize from the ledger
//!   gateway's camelCase JSON, including its legacy field names.
//! - **No Behaviour**: orchestration lives in `medledger-registry`.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
