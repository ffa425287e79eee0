//! # Ports Module
//!
//! Hexagonal architecture ports.
//!
//! - **Inbound**: APIs consumed by hosts (CLI, UI)
//! - **Outbound**: SPIs implemented by adapters (ledger, blob store, session)

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
