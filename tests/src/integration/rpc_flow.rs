//! # RPC Flow
//!
//! Drives the services through `RpcLedgerClient` against a local JSON-RPC
//! gateway, covering the wire encoding of every ledger method.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use medledger_registry::{
        InMemoryBlobStore, InMemoryLedger, LedgerClient, LedgerError, NewPatient,
        RecordIssuanceApi, RecordQueryApi, RegistryConfig, RegistryError, RegistryServices,
        RoleResolutionApi, RpcLedgerClient, Session,
    };
    use shared_types::Role;

    use crate::fixtures::{seed, DOCTOR, GATEWAY_BASE, OWNER, PATIENT_B, PATIENT_X, UNREGISTERED_Y};
    use crate::gateway::{dead_endpoint, LedgerGateway, ReceiptMode};

    fn client(endpoint: String) -> RpcLedgerClient {
        RpcLedgerClient::new(endpoint, Duration::from_secs(5), Duration::from_millis(5)).unwrap()
    }

    async fn setup(
        mode: ReceiptMode,
    ) -> (
        LedgerGateway,
        RegistryServices<RpcLedgerClient, InMemoryBlobStore>,
    ) {
        let (gateway, services, _) = setup_with_ledger(mode).await;
        (gateway, services)
    }

    async fn setup_with_ledger(
        mode: ReceiptMode,
    ) -> (
        LedgerGateway,
        RegistryServices<RpcLedgerClient, InMemoryBlobStore>,
        Arc<InMemoryLedger>,
    ) {
        let ledger = Arc::new(InMemoryLedger::new(OWNER));
        let gateway = LedgerGateway::start(ledger.clone(), mode).await;
        let rpc = Arc::new(client(gateway.endpoint()));
        seed(rpc.as_ref()).await;

        let config = RegistryConfig {
            ledger_endpoint: gateway.endpoint(),
            ..RegistryConfig::for_testing()
        };
        let services = RegistryServices::new(
            rpc,
            Arc::new(InMemoryBlobStore::new(GATEWAY_BASE)),
            &config,
        );
        (gateway, services, ledger)
    }

    #[tokio::test]
    async fn test_issue_and_list_over_rpc() {
        let (_gateway, services) = setup(ReceiptMode::Delayed(2)).await;
        let session = Session::connect(DOCTOR);

        let cid = services
            .issuer
            .stage(b"ultrasound".to_vec(), &PATIENT_X.to_string(), "Ultrasound")
            .await
            .unwrap();
        let record_id = services
            .issuer
            .commit(&session, &cid, &PATIENT_X, "Ultrasound")
            .await
            .unwrap();

        let listing = services.records.list_for_patient(&PATIENT_X).await.unwrap();
        let view = listing.get(record_id).unwrap();
        assert_eq!(view.content_id, cid);
        assert_eq!(view.uploader.address, DOCTOR);
        assert_eq!(view.owner, PATIENT_X);

        let all = services.records.list_all().await.unwrap();
        assert_eq!(all.views[0].owner, PATIENT_X);
    }

    #[tokio::test]
    async fn test_roles_and_metrics_over_rpc() {
        let (_gateway, services) = setup(ReceiptMode::Delayed(0)).await;
        let session = Session::connect(OWNER);

        assert_eq!(
            services.roles.resolve(&session, &DOCTOR).await.unwrap(),
            Role::Admin
        );
        assert_eq!(
            services.roles.resolve(&session, &PATIENT_B).await.unwrap(),
            Role::Patient
        );
        assert_eq!(
            services
                .roles
                .resolve(&session, &UNREGISTERED_Y)
                .await
                .unwrap(),
            Role::Unregistered
        );

        let snapshot = services.metrics.snapshot().await.unwrap();
        assert_eq!(snapshot.total_admins, 2);
        assert_eq!(snapshot.total_patients, 2);
    }

    #[tokio::test]
    async fn test_reverted_mint_surfaces_reason() {
        let (_gateway, services) = setup(ReceiptMode::Delayed(1)).await;
        let err = services
            .issuer
            .commit(
                &Session::connect(DOCTOR),
                &"bafy-orphan".into(),
                &UNREGISTERED_Y,
                "Biopsy",
            )
            .await
            .unwrap_err();
        assert_eq!(err, RegistryError::ledger("Patient not registered"));
    }

    #[tokio::test]
    async fn test_gateway_lost_after_submit_is_outcome_unknown() {
        let (gateway, services, ledger) = setup_with_ledger(ReceiptMode::Delayed(0)).await;
        gateway.set_receipt_mode(ReceiptMode::VanishAfterSubmit);

        let err = services
            .issuer
            .commit(
                &Session::connect(DOCTOR),
                &"bafy-vanished".into(),
                &PATIENT_X,
                "Echocardiogram",
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::OutcomeUnknown {
                operation: "mintRecord".into()
            }
        );

        // The mint was applied before the gateway went away.
        let minted = ledger.list_record_ids_for_patient(&PATIENT_X).await.unwrap();
        assert_eq!(minted.len(), 1);
    }

    #[tokio::test]
    async fn test_unconfirmed_registration_is_outcome_unknown() {
        let (gateway, services) = setup(ReceiptMode::Delayed(0)).await;
        gateway.set_receipt_mode(ReceiptMode::Never);

        let err = services
            .registration
            .register_patient(
                &Session::connect(OWNER),
                NewPatient {
                    address: UNREGISTERED_Y,
                    name: "Kiran".into(),
                    age: 44,
                    phone_number: "9123456780".into(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::OutcomeUnknown {
                operation: "addPatient".into()
            }
        );
        assert_eq!(
            services
                .roles
                .resolve(&Session::connect(OWNER), &UNREGISTERED_Y)
                .await
                .unwrap(),
            Role::Patient
        );
    }

    #[tokio::test]
    async fn test_read_rejection_maps_to_ledger_error() {
        let (gateway, _services) = setup(ReceiptMode::Delayed(0)).await;
        let rpc = client(gateway.endpoint());

        let err = rpc.get_admin_profile(&PATIENT_X).await.unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_unreachable_ledger_is_connectivity() {
        let rpc = Arc::new(client(dead_endpoint().await));
        let services = RegistryServices::new(
            rpc,
            Arc::new(InMemoryBlobStore::new(GATEWAY_BASE)),
            &RegistryConfig::for_testing(),
        );

        let err = services
            .roles
            .resolve(&Session::connect(OWNER), &OWNER)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Connectivity(_)));
    }

    #[tokio::test]
    async fn test_practitioners_over_rpc() {
        let (_gateway, services) = setup(ReceiptMode::Delayed(0)).await;
        let entries = services.directory.practitioners().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].profile.name, "Dr. Meera Rao");
    }
}

#[cfg(test)]
mod pinning_tests {
    use std::time::Duration;

    use medledger_registry::{BlobStore, BlobStoreError, PinningBlobStore, RegistryError};

    use crate::fixtures::GATEWAY_BASE;
    use crate::gateway::{dead_endpoint, PinningStub};

    fn store(api_url: String, token: &str) -> PinningBlobStore {
        PinningBlobStore::new(
            api_url,
            Some(token.to_string()),
            GATEWAY_BASE,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_upload_returns_pinned_content_id() {
        let stub = PinningStub::start("secret-jwt", "QmStubbedHash").await;
        let blobs = store(stub.api_url(), "secret-jwt");

        let cid = blobs.put(b"lab results".to_vec()).await.unwrap();
        assert_eq!(cid.as_str(), "QmStubbedHash");
        assert_eq!(
            blobs.locator_for(&cid),
            format!("{GATEWAY_BASE}/QmStubbedHash")
        );
        assert_eq!(stub.uploads().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_token_is_blob_store_error() {
        let stub = PinningStub::start("secret-jwt", "QmStubbedHash").await;
        let blobs = store(stub.api_url(), "wrong");

        let err = blobs.put(b"lab results".to_vec()).await.unwrap_err();
        assert!(matches!(err, BlobStoreError::Upload(_)));
        assert!(matches!(RegistryError::from(err), RegistryError::BlobStore(_)));
        assert!(stub.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_pinning_service_is_connectivity() {
        let blobs = store(dead_endpoint().await, "secret-jwt");
        let err = blobs.put(b"x".to_vec()).await.unwrap_err();
        assert!(matches!(RegistryError::from(err), RegistryError::Connectivity(_)));
    }
}
