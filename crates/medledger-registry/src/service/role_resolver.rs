//! # Role Resolver
//!
//! Maps a wallet address to its ledger role. Nothing is cached: every call
//! is a fresh ledger read, and the only persisted state is the session
//! entry written by `login`.

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{Address, Role};
use tracing::{debug, info, warn};

use crate::domain::{RegistryError, Session};
use crate::ports::{LedgerClient, RoleResolutionApi, SessionStore};

/// Role resolution service.
pub struct RoleResolver<L: LedgerClient> {
    ledger: Arc<L>,
}

impl<L: LedgerClient> RoleResolver<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// Resolve the session account's role, record it on the session and
    /// persist it.
    ///
    /// `Unregistered` is returned to the caller but never persisted.
    pub async fn login(
        &self,
        session: &mut Session,
        store: &dyn SessionStore,
    ) -> Result<Role, RegistryError> {
        let account = session.require_account()?;
        let role = self.resolve(session, &account).await?;
        session.set_role(role);

        if role.is_registered() {
            if let Some(entry) = session.to_persisted() {
                store.save(&entry).await?;
            }
            info!(account = %account, role = %role, "Session established");
        } else {
            store.clear().await?;
            info!(account = %account, "Account is not registered");
        }
        Ok(role)
    }

    /// Clear the session and its persisted entry.
    pub async fn logout(
        &self,
        session: &mut Session,
        store: &dyn SessionStore,
    ) -> Result<(), RegistryError> {
        if let Some(account) = session.account() {
            info!(account = %account, "Session cleared");
        }
        session.clear();
        store.clear().await?;
        Ok(())
    }

    /// Clear whatever the store holds, including an entry that no longer
    /// parses.
    pub async fn logout_stored(&self, store: &dyn SessionStore) -> Result<(), RegistryError> {
        let mut session = match self.restore(store).await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session");
                Session::disconnected()
            }
        };
        self.logout(&mut session, store).await
    }

    /// Session restored from the store, or a disconnected one.
    pub async fn restore(&self, store: &dyn SessionStore) -> Result<Session, RegistryError> {
        Ok(store
            .load()
            .await?
            .map(|entry| Session::restore(&entry))
            .unwrap_or_else(Session::disconnected))
    }
}

#[async_trait]
impl<L: LedgerClient> RoleResolutionApi for RoleResolver<L> {
    async fn resolve(&self, session: &Session, address: &Address) -> Result<Role, RegistryError> {
        session.require_account()?;
        let role = self.ledger.get_role(address).await?;
        debug!(address = %address, role = %role, "Role resolved");
        Ok(role)
    }
}
