//! Shared fixtures: a seeded in-memory ledger wired into every service.

use std::sync::Arc;

use medledger_registry::{
    InMemoryBlobStore, InMemoryLedger, LedgerClient, NewAdmin, NewPatient, RegistryConfig,
    RegistryServices, Session,
};
use shared_types::Address;

/// Bootstrap admin (deployer).
pub const OWNER: Address = Address([0x11; 20]);
/// Practitioner registered by the owner.
pub const DOCTOR: Address = Address([0x22; 20]);
/// Patient that receives records.
pub const PATIENT_X: Address = Address([0x33; 20]);
/// Registered patient with no records.
pub const PATIENT_B: Address = Address([0xBB; 20]);
/// Never registered.
pub const UNREGISTERED_A: Address = Address([0xAA; 20]);
/// Never registered either.
pub const UNREGISTERED_Y: Address = Address([0x99; 20]);

pub const GATEWAY_BASE: &str = "https://gateway.test/ipfs";

/// In-memory ledger and blob store plus the services composed over them.
pub struct Harness {
    pub ledger: Arc<InMemoryLedger>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub services: RegistryServices<InMemoryLedger, InMemoryBlobStore>,
    pub config: RegistryConfig,
}

impl Harness {
    /// Owner, one doctor, patients X and B.
    pub async fn seeded() -> Self {
        Self::with_config(RegistryConfig::for_testing()).await
    }

    pub async fn with_config(config: RegistryConfig) -> Self {
        let ledger = Arc::new(InMemoryLedger::new(OWNER));
        seed(ledger.as_ref()).await;
        let blobs = Arc::new(InMemoryBlobStore::new(GATEWAY_BASE));
        let services = RegistryServices::new(ledger.clone(), blobs.clone(), &config);
        Self {
            ledger,
            blobs,
            services,
            config,
        }
    }

    pub fn doctor_session(&self) -> Session {
        Session::connect(DOCTOR)
    }
}

/// Register the standard cast on any ledger.
pub async fn seed(ledger: &dyn LedgerClient) {
    ledger
        .register_admin(&OWNER, &doctor())
        .await
        .expect("seed doctor");
    for (address, name) in [(PATIENT_X, "Asha Verma"), (PATIENT_B, "Vikram Das")] {
        ledger
            .register_patient(
                &OWNER,
                &NewPatient {
                    address,
                    name: name.to_string(),
                    age: 34,
                    phone_number: "9876543210".to_string(),
                },
            )
            .await
            .expect("seed patient");
    }
}

pub fn doctor() -> NewAdmin {
    NewAdmin {
        address: DOCTOR,
        name: "Dr. Meera Rao".to_string(),
        institution: "City General Hospital".to_string(),
        department: "Radiology".to_string(),
        qualification: "MD".to_string(),
    }
}
