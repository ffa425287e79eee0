//! # Registration
//!
//! Privileged "add user" flow. Inputs are validated before any ledger call;
//! the ledger itself decides whether the session account may register.
//!
//! Registrations are ledger writes and share the mint deadline. One that is
//! not final in time returns `OutcomeUnknown`; check the account's role
//! before retrying.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::finality::bounded_write;
use crate::config::RegistryConfig;
use crate::domain::{check_new_admin, check_new_patient, NewAdmin, NewPatient, RegistryError, Session};
use crate::ports::LedgerClient;

/// Admin and patient registration service.
pub struct RegistrationService<L: LedgerClient> {
    ledger: Arc<L>,
    write_timeout: Duration,
}

impl<L: LedgerClient> RegistrationService<L> {
    pub fn new(ledger: Arc<L>, config: &RegistryConfig) -> Self {
        Self {
            ledger,
            write_timeout: config.mint_timeout(),
        }
    }

    pub async fn register_admin(
        &self,
        session: &Session,
        admin: NewAdmin,
    ) -> Result<(), RegistryError> {
        let sender = session.require_account()?;
        check_new_admin(&admin)?;

        bounded_write(
            "addAdmin",
            self.write_timeout,
            self.ledger.register_admin(&sender, &admin),
        )
        .await?;
        info!(admin = %admin.address, registered_by = %sender, "Admin registered");
        Ok(())
    }

    pub async fn register_patient(
        &self,
        session: &Session,
        patient: NewPatient,
    ) -> Result<(), RegistryError> {
        let sender = session.require_account()?;
        check_new_patient(&patient)?;

        bounded_write(
            "addPatient",
            self.write_timeout,
            self.ledger.register_patient(&sender, &patient),
        )
        .await?;
        info!(patient = %patient.address, registered_by = %sender, "Patient registered");
        Ok(())
    }
}
