//! # Error Types
//!
//! Errors raised while parsing shared entities.

use thiserror::Error;

/// Why a string could not be parsed into an [`crate::Address`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    /// Input does not start with `0x`.
    #[error("address must start with 0x")]
    MissingPrefix,

    /// Wrong number of hex digits after the prefix.
    #[error("address has {got} hex digits, expected {expected}")]
    InvalidLength { got: usize, expected: usize },

    /// Non-hex characters after the prefix.
    #[error("address is not valid hex: {0}")]
    InvalidHex(String),
}
