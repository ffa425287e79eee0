//! # Adapters
//!
//! Implementations of the outbound ports.
//!
//! - `ledger_rpc`: JSON-RPC ledger gateway client
//! - `pinning`: pinning-service blob store
//! - `memory`: in-memory ledger and blob store
//! - `session_store`: file and in-memory session persistence

pub mod json_rpc;
pub mod ledger_rpc;
pub mod memory;
pub mod pinning;
pub mod session_store;

pub use json_rpc::JsonRpcTransport;
pub use ledger_rpc::RpcLedgerClient;
pub use memory::{sha256_content_id, InMemoryBlobStore, InMemoryLedger, BOOTSTRAP_ADMIN_NAME};
pub use pinning::PinningBlobStore;
pub use session_store::{FileSessionStore, InMemorySessionStore};
