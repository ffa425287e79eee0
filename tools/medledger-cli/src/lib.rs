//! MedLedger CLI: operator front-end for the registry core.
//!
//! The binary composes `RegistryServices` against the configured ledger
//! gateway and pinning service; this library holds the output rendering so
//! it can be tested without a network.

pub mod output;

pub use output::{
    format_listing, format_metrics, format_practitioners, format_timestamp, format_view,
};
