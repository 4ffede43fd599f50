mod common;

use common::{doctor, script, TestWard};
use wardbook::models::prescription::{
    NewPrescription, PrescribedLine, PrescriptionStatus, QuickAction, StatusAction,
};
use wardbook::WardError;

#[actix_web::test]
async fn approve_and_reject_need_processing_first() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&[]).await;
    let medication = ward.medication("Morphine", 6, 5).await;
    let id = ward.prescription(patient, medication, "5mg").await;

    for action in [StatusAction::Approve, StatusAction::Reject] {
        let err = ward.service.handle_status(&script(), id, action, None).await.unwrap_err();
        match err {
            WardError::Validation(messages) => assert_eq!(
                messages,
                vec!["Prescription has to be processed before any actions."]
            ),
            other => panic!("unexpected {:?}", other),
        }
    }

    let status = ward
        .service
        .handle_status(&script(), id, StatusAction::Process, None)
        .await
        .unwrap();
    assert_eq!(status, PrescriptionStatus::Processing);

    let status = ward
        .service
        .handle_status(&script(), id, StatusAction::Reject, Some("Dose too high".into()))
        .await
        .unwrap();
    assert_eq!(status, PrescriptionStatus::Rejected);
    assert_eq!(ward.forwardings(id).await, 0);
}

#[actix_web::test]
async fn approval_records_a_forwarding() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&[]).await;
    let medication = ward.medication("Morphine", 6, 5).await;
    let id = ward.prescription(patient, medication, "5mg").await;

    ward.service
        .handle_status(&script(), id, StatusAction::Process, None)
        .await
        .unwrap();
    assert_eq!(ward.forwardings(id).await, 0);

    ward.service
        .handle_status(&script(), id, StatusAction::Approve, None)
        .await
        .unwrap();
    assert_eq!(ward.forwardings(id).await, 1);
}

#[actix_web::test]
async fn quick_actions_move_prescriptions_in_bulk() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&[]).await;
    let medication = ward.medication("Codeine", 5, 5).await;
    let first = ward.prescription(patient, medication, "30mg").await;
    let second = ward.prescription(patient, medication, "60mg").await;

    let moved = ward
        .service
        .quick_action(&script(), QuickAction::ProcessAllNew)
        .await
        .unwrap();
    assert_eq!(moved, vec![first, second]);

    let counts = ward.service.status_counts(&script()).await.unwrap();
    assert_eq!((counts.new, counts.processing), (0, 2));

    ward.service
        .quick_action(&script(), QuickAction::ApproveAllProcessing)
        .await
        .unwrap();
    let counts = ward.service.status_counts(&script()).await.unwrap();
    assert_eq!(counts.approved, 2);
    assert_eq!(ward.forwardings(first).await, 1);
    assert_eq!(ward.forwardings(second).await, 1);

    let options = ward
        .service
        .approved_prescriptions(&common::sister(), patient, medication)
        .await
        .unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(options[1].dosage, "60mg");
}

#[actix_web::test]
async fn only_doctors_issue_and_lines_are_checked() {
    let ward = TestWard::new().await;
    let patient = ward.patient(&[]).await;
    let medication = ward.medication("Morphine", 6, 5).await;

    let valid = NewPrescription {
        patient_id: patient,
        note: Some("post-op".into()),
        lines: vec![PrescribedLine {
            medication_id: medication,
            dosage: "5mg".into(),
        }],
    };

    assert!(matches!(
        ward.service.create_prescription(&script(), valid.clone()).await,
        Err(WardError::Forbidden(_))
    ));

    let empty = NewPrescription {
        lines: Vec::new(),
        ..valid.clone()
    };
    assert!(matches!(
        ward.service.create_prescription(&doctor(), empty).await,
        Err(WardError::Validation(_))
    ));

    let blank_dosage = NewPrescription {
        lines: vec![PrescribedLine {
            medication_id: medication,
            dosage: String::new(),
        }],
        ..valid.clone()
    };
    assert!(matches!(
        ward.service.create_prescription(&doctor(), blank_dosage).await,
        Err(WardError::Validation(_))
    ));

    let unknown_medication = NewPrescription {
        lines: vec![PrescribedLine {
            medication_id: 777,
            dosage: "5mg".into(),
        }],
        ..valid.clone()
    };
    assert!(matches!(
        ward.service.create_prescription(&doctor(), unknown_medication).await,
        Err(WardError::NotFound { entity: "medication", .. })
    ));

    ward.service.create_prescription(&doctor(), valid).await.unwrap();
    let counts = ward.service.status_counts(&script()).await.unwrap();
    assert_eq!(counts.new, 1);
}
