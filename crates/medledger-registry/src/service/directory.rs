//! # Directory
//!
//! Profile lookups and the practitioner listing.

use std::sync::Arc;

use shared_types::{AdminProfile, Address, PatientProfile};
use tracing::debug;

use crate::domain::{display_rating, PractitionerEntry, RegistryError, Session};
use crate::ports::LedgerClient;

/// Profile and practitioner directory.
pub struct DirectoryService<L: LedgerClient> {
    ledger: Arc<L>,
}

impl<L: LedgerClient> DirectoryService<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// Admin profile of the session account (keyed lookup).
    pub async fn my_admin_profile(&self, session: &Session) -> Result<AdminProfile, RegistryError> {
        let account = session.require_account()?;
        self.admin_profile(&account).await
    }

    /// Patient profile of the session account.
    pub async fn my_patient_profile(
        &self,
        session: &Session,
    ) -> Result<PatientProfile, RegistryError> {
        let account = session.require_account()?;
        self.patient_profile(&account).await
    }

    pub async fn admin_profile(&self, address: &Address) -> Result<AdminProfile, RegistryError> {
        Ok(self.ledger.get_admin_profile(address).await?)
    }

    pub async fn patient_profile(
        &self,
        address: &Address,
    ) -> Result<PatientProfile, RegistryError> {
        Ok(self.ledger.get_patient_profile(address).await?)
    }

    /// Registered practitioners, excluding the bootstrap admin, each with a
    /// stable display rating.
    pub async fn practitioners(&self) -> Result<Vec<PractitionerEntry>, RegistryError> {
        let admins = self.ledger.list_admins().await?;
        let entries: Vec<_> = admins
            .into_iter()
            .skip(1)
            .map(|profile| PractitionerEntry {
                display_rating: display_rating(&profile),
                profile,
            })
            .collect();
        debug!(count = entries.len(), "Practitioners listed");
        Ok(entries)
    }
}
