mod common;

use common::{at, nurse, sister, TestWard};
use wardbook::models::administration::{
    AdministerRequest, AdministeredFilter, AdministeredSort, EditAdministrationRequest,
};
use wardbook::WardError;

fn request(patient_id: i64, medication_id: i64, prescription_id: Option<i64>) -> AdministerRequest {
    AdministerRequest {
        patient_id,
        medication_id,
        prescription_id,
        dosage: "1 tablet".to_string(),
    }
}

fn messages(err: WardError) -> Vec<String> {
    match err {
        WardError::Validation(messages) => messages,
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[actix_web::test]
async fn low_schedule_needs_no_prescription() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&[]).await;

    for schedule in 0..=4 {
        let medication = ward.medication(&format!("Tier {} tablet", schedule), schedule, 5).await;
        let id = ward
            .service
            .record_administration(&nurse(), request(patient, medication, None))
            .await
            .unwrap();
        assert!(id > 0);
        assert_eq!(ward.quantity(medication).await, 4);
    }
}

#[actix_web::test]
async fn supplied_prescription_is_dropped_below_threshold() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&[]).await;
    let medication = ward.medication("Ibuprofen", 3, 5).await;
    let prescription = ward.approved_prescription(patient, medication, "400mg").await;

    ward.service
        .record_administration(&sister(), request(patient, medication, Some(prescription)))
        .await
        .unwrap();

    let rows = ward
        .service
        .list_administered(&sister(), &AdministeredFilter::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].prescription_id, None);
}

#[actix_web::test]
async fn high_schedule_requires_approved_matching_prescription() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&[]).await;
    let other_patient = ward.patient(&[]).await;
    let morphine = ward.medication("Morphine", 6, 5).await;
    let codeine = ward.medication("Codeine", 5, 5).await;

    // No prescription at all.
    let err = ward
        .service
        .record_administration(&sister(), request(patient, morphine, None))
        .await
        .unwrap_err();
    assert_eq!(
        messages(err),
        vec!["A prescription is required for Schedule 5 and above medications."]
    );

    // Prescription still New.
    let pending = ward.prescription(patient, morphine, "5mg").await;
    assert!(matches!(
        ward.service
            .record_administration(&sister(), request(patient, morphine, Some(pending)))
            .await,
        Err(WardError::Validation(_))
    ));

    // Approved, but for another medication.
    let for_codeine = ward.approved_prescription(patient, codeine, "30mg").await;
    assert!(matches!(
        ward.service
            .record_administration(&sister(), request(patient, morphine, Some(for_codeine)))
            .await,
        Err(WardError::Validation(_))
    ));

    // Approved, but for another patient.
    let not_theirs = ward.approved_prescription(other_patient, morphine, "5mg").await;
    assert!(matches!(
        ward.service
            .record_administration(&sister(), request(patient, morphine, Some(not_theirs)))
            .await,
        Err(WardError::Validation(_))
    ));

    assert_eq!(ward.quantity(morphine).await, 5);

    let approved = ward.approved_prescription(patient, morphine, "5mg").await;
    ward.service
        .record_administration(&sister(), request(patient, morphine, Some(approved)))
        .await
        .unwrap();

    let rows = ward
        .service
        .list_administered(&sister(), &AdministeredFilter::default())
        .await
        .unwrap();
    assert_eq!(rows[0].prescription_id, Some(approved));
    assert_eq!(ward.quantity(morphine).await, 4);
}

#[actix_web::test]
async fn nurses_cannot_give_high_schedule_medication() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&[]).await;
    let morphine = ward.medication("Morphine", 6, 5).await;
    let approved = ward.approved_prescription(patient, morphine, "5mg").await;

    let err = ward
        .service
        .record_administration(&nurse(), request(patient, morphine, Some(approved)))
        .await
        .unwrap_err();
    assert_eq!(
        messages(err),
        vec!["You cannot administer medication with a schedule higher than 4."]
    );
}

#[actix_web::test]
async fn stock_decrements_by_one_and_never_goes_negative() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&[]).await;
    let medication = ward.medication("Paracetamol", 1, 2).await;

    for expected in [1, 0] {
        ward.service
            .record_administration(&nurse(), request(patient, medication, None))
            .await
            .unwrap();
        assert_eq!(ward.quantity(medication).await, expected);
    }

    let err = ward
        .service
        .record_administration(&nurse(), request(patient, medication, None))
        .await
        .unwrap_err();
    assert_eq!(messages(err), vec!["Medication is out of stock!"]);
    assert_eq!(ward.quantity(medication).await, 0);
}

#[actix_web::test]
async fn allergy_conflict_blocks_matching_names_only() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&["Penicillin"]).await;
    let blocked = ward.medication("Amoxicillin-Penicillin-G", 2, 5).await;
    let allowed = ward.medication("Paracetamol", 2, 5).await;

    let err = ward
        .service
        .record_administration(&nurse(), request(patient, blocked, None))
        .await
        .unwrap_err();
    assert_eq!(
        messages(err),
        vec!["This medication may cause an allergic reaction! Cannot administer."]
    );
    assert_eq!(ward.quantity(blocked).await, 5);

    ward.service
        .record_administration(&nurse(), request(patient, allowed, None))
        .await
        .unwrap();
}

#[actix_web::test]
async fn violations_are_reported_together() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&["morph"]).await;
    let morphine = ward.medication("Morphine", 6, 5).await;

    let err = ward
        .service
        .record_administration(&sister(), request(patient, morphine, None))
        .await
        .unwrap_err();
    assert_eq!(messages(err).len(), 2);
}

#[actix_web::test]
async fn unknown_or_deleted_medication_is_not_found() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&[]).await;
    let medication = ward.medication("Paracetamol", 1, 5).await;
    ward.service
        .delete_medication(&common::admin(), medication)
        .await
        .unwrap();

    for id in [medication, 9999] {
        assert!(matches!(
            ward.service
                .record_administration(&nurse(), request(patient, id, None))
                .await,
            Err(WardError::NotFound { entity: "medication", .. })
        ));
    }
}

#[actix_web::test]
async fn other_roles_are_forbidden() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&[]).await;
    let medication = ward.medication("Paracetamol", 1, 5).await;

    for actor in [common::admin(), common::doctor(), common::script()] {
        assert!(matches!(
            ward.service
                .record_administration(&actor, request(patient, medication, None))
                .await,
            Err(WardError::Forbidden(_))
        ));
    }
}

#[actix_web::test]
async fn editing_to_low_schedule_clears_prescription_link() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&[]).await;
    let morphine = ward.medication("Morphine", 6, 5).await;
    let paracetamol = ward.medication("Paracetamol", 3, 5).await;
    let approved = ward.approved_prescription(patient, morphine, "5mg").await;

    let id = ward
        .service
        .record_administration(&sister(), request(patient, morphine, Some(approved)))
        .await
        .unwrap();

    ward.service
        .edit_administration(
            &sister(),
            id,
            EditAdministrationRequest {
                medication_id: paracetamol,
                prescription_id: Some(approved),
                dosage: "1g".to_string(),
                administered_at: at(1, 9, 30),
                expected_version: None,
            },
        )
        .await
        .unwrap();

    let rows = ward
        .service
        .list_administered(&sister(), &AdministeredFilter::default())
        .await
        .unwrap();
    assert_eq!(rows[0].medication_name, "Paracetamol");
    assert_eq!(rows[0].prescription_id, None);
    assert_eq!(rows[0].administered_at, at(1, 9, 30));

    // Stock is left untouched by edits.
    assert_eq!(ward.quantity(morphine).await, 4);
    assert_eq!(ward.quantity(paracetamol).await, 5);
}

#[actix_web::test]
async fn edit_rechecks_schedule_gate() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&[]).await;
    let paracetamol = ward.medication("Paracetamol", 2, 5).await;
    let morphine = ward.medication("Morphine", 6, 5).await;

    let id = ward
        .service
        .record_administration(&sister(), request(patient, paracetamol, None))
        .await
        .unwrap();

    let err = ward
        .service
        .edit_administration(
            &sister(),
            id,
            EditAdministrationRequest {
                medication_id: morphine,
                prescription_id: None,
                dosage: "5mg".to_string(),
                administered_at: at(1, 9, 0),
                expected_version: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WardError::Validation(_)));
}

#[actix_web::test]
async fn stale_edit_is_a_conflict() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&[]).await;
    let medication = ward.medication("Paracetamol", 2, 5).await;
    let id = ward
        .service
        .record_administration(&nurse(), request(patient, medication, None))
        .await
        .unwrap();

    let edit = |version| EditAdministrationRequest {
        medication_id: medication,
        prescription_id: None,
        dosage: "2 tablets".to_string(),
        administered_at: at(1, 10, 0),
        expected_version: Some(version),
    };

    ward.service.edit_administration(&nurse(), id, edit(0)).await.unwrap();
    assert!(matches!(
        ward.service.edit_administration(&nurse(), id, edit(0)).await,
        Err(WardError::ConcurrencyConflict)
    ));
}

#[actix_web::test]
async fn delete_is_soft_and_keeps_stock() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&[]).await;
    let medication = ward.medication("Paracetamol", 2, 5).await;
    let id = ward
        .service
        .record_administration(&nurse(), request(patient, medication, None))
        .await
        .unwrap();

    ward.service.delete_administration(&nurse(), id).await.unwrap();
    // Deleting twice is harmless.
    ward.service.delete_administration(&nurse(), id).await.unwrap();

    let rows = ward
        .service
        .list_administered(&nurse(), &AdministeredFilter::default())
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert_eq!(ward.quantity(medication).await, 4);

    assert!(matches!(
        ward.service.delete_administration(&nurse(), 4242).await,
        Err(WardError::NotFound { .. })
    ));
    assert!(matches!(
        ward.service
            .edit_administration(
                &nurse(),
                id,
                EditAdministrationRequest {
                    medication_id: medication,
                    prescription_id: None,
                    dosage: "1".to_string(),
                    administered_at: at(1, 9, 0),
                    expected_version: None,
                },
            )
            .await,
        Err(WardError::NotFound { .. })
    ));
}

#[actix_web::test]
async fn form_auto_selects_single_prescription() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&["Latex"]).await;
    let morphine = ward.medication("Morphine", 6, 5).await;
    let codeine = ward.medication("Codeine", 5, 5).await;
    let approved = ward.approved_prescription(patient, morphine, "5mg").await;

    let form = ward
        .service
        .administration_form(&sister(), patient, Some(morphine))
        .await
        .unwrap();
    assert_eq!(form.allergies, vec!["Latex"]);
    assert_eq!(form.medications.len(), 2);
    assert!(form.requires_prescription);
    assert_eq!(form.selected_prescription_id, Some(approved));
    assert_eq!(form.prescribed_dosage.as_deref(), Some("5mg"));
    assert!(form.warning.is_none());

    let form = ward
        .service
        .administration_form(&sister(), patient, Some(codeine))
        .await
        .unwrap();
    assert!(form.prescriptions.is_empty());
    assert!(form.warning.is_some());
}

#[actix_web::test]
async fn listing_filters_and_sorts() {
    let ward = TestWard::new().await;
    let anele = ward.patient_named("Anele", "Zulu", &[]).await;
    let bongani = ward.patient_named("Bongani", "Dube", &[]).await;
    let medication = ward.medication("Paracetamol", 1, 10).await;

    ward.set_time(at(2, 8, 0));
    ward.service
        .record_administration(&nurse(), request(bongani, medication, None))
        .await
        .unwrap();
    ward.set_time(at(3, 8, 0));
    ward.service
        .record_administration(&nurse(), request(anele, medication, None))
        .await
        .unwrap();

    let filter = AdministeredFilter {
        sort: AdministeredSort::DateDesc,
        ..Default::default()
    };
    let rows = ward.service.list_administered(&nurse(), &filter).await.unwrap();
    assert_eq!(rows[0].patient_name, "Anele Zulu");

    let filter = AdministeredFilter {
        search: Some("dube".to_string()),
        ..Default::default()
    };
    let rows = ward.service.list_administered(&nurse(), &filter).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].patient_id, bongani);

    let filter = AdministeredFilter {
        to: Some(at(2, 8, 0)),
        ..Default::default()
    };
    let rows = ward.service.list_administered(&nurse(), &filter).await.unwrap();
    assert_eq!(rows.len(), 1);

    let filter = AdministeredFilter {
        search: Some("  ANELE zu ".to_string()),
        from: Some(at(2, 9, 0)),
        ..Default::default()
    };
    let rows = ward.service.list_administered(&nurse(), &filter).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].patient_id, anele);

    let filter = AdministeredFilter {
        search: Some("dube".to_string()),
        from: Some(at(2, 9, 0)),
        ..Default::default()
    };
    let rows = ward.service.list_administered(&nurse(), &filter).await.unwrap();
    assert!(rows.is_empty());

    let filter = AdministeredFilter {
        search: Some("   ".to_string()),
        ..Default::default()
    };
    let rows = ward.service.list_administered(&nurse(), &filter).await.unwrap();
    assert_eq!(rows.len(), 2);
}
