//! # Issuance Flow
//!
//! Stage a document, commit it, and find it again through the aggregator.

#[cfg(test)]
mod tests {
    use medledger_registry::{BlobStore, RecordIssuanceApi, RecordQueryApi, RegistryError};
    use shared_types::ContentId;

    use crate::fixtures::{Harness, PATIENT_X, UNREGISTERED_Y};

    #[tokio::test]
    async fn test_stage_then_commit_is_listed_for_patient() {
        let h = Harness::seeded().await;
        let session = h.doctor_session();

        let content_id = h
            .services
            .issuer
            .stage(b"%PDF-1.7 chest x-ray".to_vec(), &PATIENT_X.to_string(), "Chest X-Ray")
            .await
            .unwrap();
        let record_id = h
            .services
            .issuer
            .commit(&session, &content_id, &PATIENT_X, "Chest X-Ray")
            .await
            .unwrap();

        let listing = h.services.records.list_for_patient(&PATIENT_X).await.unwrap();
        let view = listing.get(record_id).expect("committed record is listed");
        assert_eq!(view.document_name, "Chest X-Ray");
        assert_eq!(view.content_id, content_id);
        assert_eq!(view.uploader.address, session.account().unwrap());
        assert_eq!(view.locator, h.blobs.locator_for(&content_id));
        assert_eq!(h.blobs.get(&content_id).unwrap(), b"%PDF-1.7 chest x-ray".to_vec());
    }

    #[tokio::test]
    async fn test_successive_commits_yield_distinct_ids() {
        let h = Harness::seeded().await;
        let session = h.doctor_session();
        let mut ids = Vec::new();

        for i in 0..5 {
            let name = format!("Lab Report {i}");
            let cid = h
                .services
                .issuer
                .stage(format!("report {i}").into_bytes(), &PATIENT_X.to_string(), &name)
                .await
                .unwrap();
            ids.push(
                h.services
                    .issuer
                    .commit(&session, &cid, &PATIENT_X, &name)
                    .await
                    .unwrap(),
            );
        }

        let mut deduped = ids.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }

    #[tokio::test]
    async fn test_uploader_record_count_increments() {
        let h = Harness::seeded().await;
        let session = h.doctor_session();
        let cid = h
            .services
            .issuer
            .stage(b"ecg".to_vec(), &PATIENT_X.to_string(), "ECG")
            .await
            .unwrap();
        h.services
            .issuer
            .commit(&session, &cid, &PATIENT_X, "ECG")
            .await
            .unwrap();

        let profile = h.services.directory.my_admin_profile(&session).await.unwrap();
        assert_eq!(profile.total_records_issued, 1);
    }

    /// Commit for an unregistered patient reverts and leaves nothing behind
    /// on the ledger; the staged blob stays.
    #[tokio::test]
    async fn test_commit_to_unregistered_patient_reverts() {
        let h = Harness::seeded().await;
        let session = h.doctor_session();

        let content_id = h
            .services
            .issuer
            .stage(b"mri".to_vec(), &PATIENT_X.to_string(), "MRI")
            .await
            .unwrap();
        let err = h
            .services
            .issuer
            .commit(&session, &content_id, &UNREGISTERED_Y, "MRI")
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::Ledger { .. }));
        assert!(h
            .services
            .records
            .list_for_patient(&UNREGISTERED_Y)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(h.blobs.get(&content_id).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfirmed_mint_is_reconciled_not_retried() {
        let h = Harness::seeded().await;
        let session = h.doctor_session();
        let content_id = ContentId::new("bafy-discharge");

        h.ledger.hang_writes(true);
        let err = h
            .services
            .issuer
            .commit(&session, &content_id, &PATIENT_X, "Discharge Summary")
            .await
            .unwrap_err();
        assert!(err.is_outcome_unknown());
        h.ledger.hang_writes(false);

        let landed = h
            .services
            .issuer
            .reconcile(&content_id, &PATIENT_X, "Discharge Summary")
            .await
            .unwrap();
        let record_id = landed.expect("mint landed despite the timeout");

        let listing = h.services.records.list_for_patient(&PATIENT_X).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing.views[0].record_id, record_id);
    }

    #[tokio::test]
    async fn test_independent_pipelines_run_concurrently() {
        let h = Harness::seeded().await;
        let session = h.doctor_session();
        let issuer = &h.services.issuer;
        let patient = PATIENT_X.to_string();

        let pipeline = |name: &'static str| {
            let session = session.clone();
            let patient = patient.clone();
            async move {
                let cid = issuer
                    .stage(name.as_bytes().to_vec(), &patient, name)
                    .await?;
                issuer.commit(&session, &cid, &PATIENT_X, name).await
            }
        };

        let (a, b, c) = tokio::join!(pipeline("CBC"), pipeline("Lipid Panel"), pipeline("HbA1c"));
        let mut ids = vec![a.unwrap(), b.unwrap(), c.unwrap()];
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
