//! Deadline handling for ledger writes.
//!
//! A write that was never answered, timed out or lost its receipt may still
//! land. All three surface as `OutcomeUnknown` for the operation; anything
//! else is a definite failure.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::domain::RegistryError;
use crate::ports::LedgerError;

pub(crate) async fn bounded_write<T>(
    operation: &str,
    deadline: Duration,
    write: impl Future<Output = Result<T, LedgerError>>,
) -> Result<T, RegistryError> {
    let cause = match tokio::time::timeout(deadline, write).await {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(LedgerError::Timeout { .. })) | Err(_) => "not final before deadline".to_string(),
        Ok(Err(LedgerError::Unconfirmed { tx_hash, cause })) => {
            format!("{tx_hash} unconfirmed: {cause}")
        }
        Ok(Err(e)) => return Err(e.into()),
    };

    warn!(operation, cause = %cause, "Write outcome unknown");
    Err(RegistryError::OutcomeUnknown {
        operation: operation.to_string(),
    })
}
