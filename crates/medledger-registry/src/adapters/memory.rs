//! In-memory ledger and blob store.
//!
//! Reproduce the registry contract's rules (privileged registration, admin-only
//! minting, monotonically assigned record ids) without a network. The
//! ledger supports fault injection for fan-out and cancellation scenarios.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use shared_types::{
    AdminProfile, Address, ContentId, LedgerMetrics, PatientProfile, Record, RecordId,
    RecordMetadata, Role,
};

use crate::domain::{MintRequest, NewAdmin, NewPatient};
use crate::ports::{gateway_locator, BlobStore, BlobStoreError, LedgerClient, LedgerError};

/// Name given to the bootstrap admin created with the ledger.
pub const BOOTSTRAP_ADMIN_NAME: &str = "Registry Owner";

#[derive(Default)]
struct LedgerState {
    admins: Vec<AdminProfile>,
    patients: Vec<PatientProfile>,
    /// Mint order.
    records: Vec<Record>,
    next_record_id: RecordId,
}

impl LedgerState {
    fn admin(&self, address: &Address) -> Option<&AdminProfile> {
        self.admins.iter().find(|a| &a.address == address)
    }

    fn patient(&self, address: &Address) -> Option<&PatientProfile> {
        self.patients.iter().find(|p| &p.address == address)
    }

    fn record(&self, record_id: RecordId) -> Result<&Record, LedgerError> {
        self.records
            .iter()
            .find(|r| r.record_id == record_id)
            .ok_or_else(|| LedgerError::Rejected(format!("Record {record_id} does not exist")))
    }

    fn require_admin_sender(&self, sender: &Address, action: &str) -> Result<(), LedgerError> {
        if self.admin(sender).is_none() {
            return Err(revert(format!("Only admins can {action}")));
        }
        Ok(())
    }

    fn require_unregistered(&self, address: &Address) -> Result<(), LedgerError> {
        if self.admin(address).is_some() || self.patient(address).is_some() {
            return Err(revert("Address already registered"));
        }
        Ok(())
    }
}

#[derive(Default)]
struct FaultPlan {
    offline: bool,
    hang_writes: bool,
    lose_write_receipts: bool,
    metadata_failures: HashMap<RecordId, LedgerError>,
    metadata_delays: HashMap<RecordId, Duration>,
}

fn revert(reason: impl Into<String>) -> LedgerError {
    LedgerError::Reverted {
        reason: Some(reason.into()),
    }
}

fn now_secs() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

/// In-memory ledger honouring the registry contract's rules.
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
    faults: RwLock<FaultPlan>,
    calls: AtomicUsize,
    metadata_in_flight: AtomicUsize,
    peak_metadata_in_flight: AtomicUsize,
}

/// Counts one metadata lookup as in flight until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(current: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(current)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl InMemoryLedger {
    /// Create a ledger whose first admin is `owner`.
    pub fn new(owner: Address) -> Self {
        let state = LedgerState {
            admins: vec![AdminProfile {
                admin_id: 1,
                address: owner,
                name: BOOTSTRAP_ADMIN_NAME.to_string(),
                institution: String::new(),
                department: String::new(),
                qualification: String::new(),
                total_records_issued: 0,
            }],
            next_record_id: 1,
            ..Default::default()
        };
        Self {
            state: RwLock::new(state),
            faults: RwLock::new(FaultPlan::default()),
            calls: AtomicUsize::new(0),
            metadata_in_flight: AtomicUsize::new(0),
            peak_metadata_in_flight: AtomicUsize::new(0),
        }
    }

    /// Number of port calls served (including failed ones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every call fail with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.faults.write().offline = offline;
    }

    /// Highest number of metadata lookups served at once.
    pub fn peak_metadata_in_flight(&self) -> usize {
        self.peak_metadata_in_flight.load(Ordering::SeqCst)
    }

    /// Apply writes (mints and registrations) but never report finality.
    pub fn hang_writes(&self, hang: bool) {
        self.faults.write().hang_writes = hang;
    }

    /// Apply writes but report them `Unconfirmed`.
    pub fn lose_write_receipts(&self, lose: bool) {
        self.faults.write().lose_write_receipts = lose;
    }

    /// Fail metadata lookups for one record.
    pub fn fail_metadata(&self, record_id: RecordId, error: LedgerError) {
        self.faults.write().metadata_failures.insert(record_id, error);
    }

    /// Delay metadata lookups for one record.
    pub fn delay_metadata(&self, record_id: RecordId, delay: Duration) {
        self.faults.write().metadata_delays.insert(record_id, delay);
    }

    /// Drop all injected faults.
    pub fn clear_faults(&self) {
        *self.faults.write() = FaultPlan::default();
    }

    /// Snapshot of a stored record.
    pub fn record(&self, record_id: RecordId) -> Option<Record> {
        self.state.read().record(record_id).ok().cloned()
    }

    fn enter(&self) -> Result<(), LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.faults.read().offline {
            return Err(LedgerError::Transport("ledger offline".to_string()));
        }
        Ok(())
    }

    /// Report an applied write according to the fault plan.
    async fn settle<T>(&self, applied: T) -> Result<T, LedgerError> {
        let (hang, lose) = {
            let faults = self.faults.read();
            (faults.hang_writes, faults.lose_write_receipts)
        };
        if lose {
            return Err(LedgerError::Unconfirmed {
                tx_hash: format!("0x{:064x}", self.calls()),
                cause: "receipt lost".to_string(),
            });
        }
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(applied)
    }

    fn apply_mint(&self, sender: &Address, request: &MintRequest) -> Result<RecordId, LedgerError> {
        let mut state = self.state.write();
        state.require_admin_sender(sender, "mint records")?;
        if state.patient(&request.patient).is_none() {
            return Err(revert("Patient not registered"));
        }
        if request.content_id.is_empty() {
            return Err(revert("Content id required"));
        }

        let record_id = state.next_record_id;
        state.next_record_id += 1;
        state.records.push(Record {
            record_id,
            content_id: request.content_id.clone(),
            document_name: request.document_name.clone(),
            mint_timestamp: now_secs(),
            uploader: *sender,
            owner: request.patient,
        });
        if let Some(admin) = state.admins.iter_mut().find(|a| &a.address == sender) {
            admin.total_records_issued += 1;
        }
        Ok(record_id)
    }

    fn apply_admin(&self, sender: &Address, admin: &NewAdmin) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        state.require_admin_sender(sender, "add admins")?;
        state.require_unregistered(&admin.address)?;
        let admin_id = state.admins.len() as u64 + 1;
        state.admins.push(AdminProfile {
            admin_id,
            address: admin.address,
            name: admin.name.clone(),
            institution: admin.institution.clone(),
            department: admin.department.clone(),
            qualification: admin.qualification.clone(),
            total_records_issued: 0,
        });
        Ok(())
    }

    fn apply_patient(&self, sender: &Address, patient: &NewPatient) -> Result<(), LedgerError> {
        let mut state = self.state.write();
        state.require_admin_sender(sender, "add patients")?;
        state.require_unregistered(&patient.address)?;
        let patient_id = state.patients.len() as u64 + 1;
        state.patients.push(PatientProfile {
            patient_id,
            address: patient.address,
            name: patient.name.clone(),
            age: patient.age,
            phone_number: patient.phone_number.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn get_role(&self, address: &Address) -> Result<Role, LedgerError> {
        self.enter()?;
        let state = self.state.read();
        Ok(if state.admin(address).is_some() {
            Role::Admin
        } else if state.patient(address).is_some() {
            Role::Patient
        } else {
            Role::Unregistered
        })
    }

    async fn list_admins(&self) -> Result<Vec<AdminProfile>, LedgerError> {
        self.enter()?;
        Ok(self.state.read().admins.clone())
    }

    async fn get_admin_profile(&self, address: &Address) -> Result<AdminProfile, LedgerError> {
        self.enter()?;
        self.state
            .read()
            .admin(address)
            .cloned()
            .ok_or_else(|| LedgerError::Rejected("Admin not found".to_string()))
    }

    async fn get_patient_profile(
        &self,
        address: &Address,
    ) -> Result<PatientProfile, LedgerError> {
        self.enter()?;
        self.state
            .read()
            .patient(address)
            .cloned()
            .ok_or_else(|| LedgerError::Rejected("Patient not found".to_string()))
    }

    async fn list_record_ids_for_patient(
        &self,
        address: &Address,
    ) -> Result<Vec<RecordId>, LedgerError> {
        self.enter()?;
        Ok(self
            .state
            .read()
            .records
            .iter()
            .filter(|r| &r.owner == address)
            .map(|r| r.record_id)
            .collect())
    }

    async fn list_all_record_ids(&self) -> Result<Vec<RecordId>, LedgerError> {
        self.enter()?;
        Ok(self.state.read().records.iter().map(|r| r.record_id).collect())
    }

    async fn get_record_metadata(
        &self,
        record_id: RecordId,
    ) -> Result<RecordMetadata, LedgerError> {
        self.enter()?;
        let _in_flight =
            InFlight::enter(&self.metadata_in_flight, &self.peak_metadata_in_flight);
        let (failure, delay) = {
            let faults = self.faults.read();
            (
                faults.metadata_failures.get(&record_id).cloned(),
                faults.metadata_delays.get(&record_id).copied(),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = failure {
            return Err(err);
        }
        self.state.read().record(record_id).map(Record::metadata)
    }

    async fn get_content_locator(&self, record_id: RecordId) -> Result<ContentId, LedgerError> {
        self.enter()?;
        self.state
            .read()
            .record(record_id)
            .map(|r| r.content_id.clone())
    }

    async fn owner_of(&self, record_id: RecordId) -> Result<Address, LedgerError> {
        self.enter()?;
        self.state.read().record(record_id).map(|r| r.owner)
    }

    async fn mint_record(
        &self,
        sender: &Address,
        request: &MintRequest,
    ) -> Result<RecordId, LedgerError> {
        self.enter()?;
        let record_id = self.apply_mint(sender, request)?;
        self.settle(record_id).await
    }

    async fn register_admin(&self, sender: &Address, admin: &NewAdmin) -> Result<(), LedgerError> {
        self.enter()?;
        self.apply_admin(sender, admin)?;
        self.settle(()).await
    }

    async fn register_patient(
        &self,
        sender: &Address,
        patient: &NewPatient,
    ) -> Result<(), LedgerError> {
        self.enter()?;
        self.apply_patient(sender, patient)?;
        self.settle(()).await
    }

    async fn get_metrics(&self) -> Result<LedgerMetrics, LedgerError> {
        self.enter()?;
        let state = self.state.read();
        Ok(LedgerMetrics {
            total_admins: state.admins.len() as u64,
            total_patients: state.patients.len() as u64,
            total_records: state.records.len() as u64,
        })
    }
}

/// Content id of `bytes` as the in-memory store derives it.
pub fn sha256_content_id(bytes: &[u8]) -> ContentId {
    ContentId::new(hex::encode(Sha256::digest(bytes)))
}

/// In-memory content-addressable blob store keyed by SHA-256.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<ContentId, Vec<u8>>>,
    gateway_base: String,
    fail_uploads: RwLock<bool>,
    puts: AtomicUsize,
}

impl InMemoryBlobStore {
    pub fn new(gateway_base: impl Into<String>) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            gateway_base: gateway_base.into(),
            fail_uploads: RwLock::new(false),
            puts: AtomicUsize::new(0),
        }
    }

    /// Make uploads fail with a transport error.
    pub fn set_fail_uploads(&self, fail: bool) {
        *self.fail_uploads.write() = fail;
    }

    /// Stored bytes for a content id.
    pub fn get(&self, content_id: &ContentId) -> Option<Vec<u8>> {
        self.blobs.read().get(content_id).cloned()
    }

    /// Number of distinct blobs held.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Number of `put` calls received.
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new("https://gateway.example/ipfs")
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, bytes: Vec<u8>) -> Result<ContentId, BlobStoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if *self.fail_uploads.read() {
            return Err(BlobStoreError::Transport("blob store unreachable".to_string()));
        }
        let content_id = sha256_content_id(&bytes);
        self.blobs.write().entry(content_id.clone()).or_insert(bytes);
        Ok(content_id)
    }

    fn locator_for(&self, content_id: &ContentId) -> String {
        gateway_locator(&self.gateway_base, content_id)
    }
}
