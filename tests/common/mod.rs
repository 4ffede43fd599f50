#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;

use wardbook::auth::{CurrentUser, Role};
use wardbook::config::WardConfig;
use wardbook::db::{queries, Database};
use wardbook::models::medication::{Medication, NewMedication};
use wardbook::models::patient::NewPatient;
use wardbook::models::prescription::{NewPrescription, PrescribedLine, StatusAction};
use wardbook::WardService;

pub fn admin() -> CurrentUser {
    CurrentUser::new(1, Role::Admin)
}

pub fn nurse() -> CurrentUser {
    CurrentUser::new(2, Role::Nurse)
}

pub fn sister() -> CurrentUser {
    CurrentUser::new(3, Role::Sister)
}

pub fn script() -> CurrentUser {
    CurrentUser::new(4, Role::Script)
}

pub fn doctor() -> CurrentUser {
    CurrentUser::new(5, Role::Doctor)
}

pub fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .unwrap()
}

/// Service over a fresh in-memory store with a clock the test controls.
pub struct TestWard {
    pub service: WardService,
    clock: Arc<Mutex<NaiveDateTime>>,
}

impl TestWard {
    pub async fn new() -> Self {
        let db = Database::in_memory().await.expect("in-memory database");
        Self::with_database(db).await
    }

    /// Service over a fresh database file with a real connection pool.
    pub async fn on_disk(max_connections: u32) -> (Self, PathBuf) {
        let path = std::env::temp_dir().join(format!("wardbook-{}.db", uuid::Uuid::new_v4()));
        let url = format!("sqlite://{}", path.display());
        let db = Database::connect(&url, max_connections).await.expect("file database");
        (Self::with_database(db).await, path)
    }

    async fn with_database(db: Database) -> Self {
        db.run_migrations().await.expect("migrations");

        let clock = Arc::new(Mutex::new(at(1, 8, 0)));
        let handle = clock.clone();
        let service = WardService::new(db, WardConfig::default())
            .with_clock(move || *handle.lock().unwrap());

        Self { service, clock }
    }

    pub fn set_time(&self, time: NaiveDateTime) {
        *self.clock.lock().unwrap() = time;
    }

    pub async fn patient_named(&self, first: &str, last: &str, allergies: &[&str]) -> i64 {
        self.service
            .create_patient(
                &admin(),
                NewPatient {
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    allergies: allergies.iter().map(|a| a.to_string()).collect(),
                },
            )
            .await
            .expect("create patient")
    }

    pub async fn patient(&self, allergies: &[&str]) -> i64 {
        let first: String = FirstName().fake();
        let last: String = LastName().fake();
        self.patient_named(&first, &last, allergies).await
    }

    pub async fn medication(&self, name: &str, schedule: i64, quantity: i64) -> i64 {
        self.service
            .create_medication(
                &admin(),
                NewMedication {
                    name: name.to_string(),
                    schedule,
                    quantity,
                    expiry_date: None,
                },
            )
            .await
            .expect("create medication")
    }

    pub async fn find_medication(&self, id: i64) -> Medication {
        let mut conn = self.service.db().pool().acquire().await.unwrap();
        queries::find_medication(&mut *conn, id).await.unwrap().expect("medication exists")
    }

    pub async fn quantity(&self, medication_id: i64) -> i64 {
        self.find_medication(medication_id).await.quantity
    }

    pub async fn forwardings(&self, prescription_id: i64) -> i64 {
        let mut conn = self.service.db().pool().acquire().await.unwrap();
        queries::count_forwardings(&mut *conn, prescription_id).await.unwrap()
    }

    /// Prescription issued by a doctor and left in status New.
    pub async fn prescription(&self, patient_id: i64, medication_id: i64, dosage: &str) -> i64 {
        self.service
            .create_prescription(
                &doctor(),
                NewPrescription {
                    patient_id,
                    note: None,
                    lines: vec![PrescribedLine {
                        medication_id,
                        dosage: dosage.to_string(),
                    }],
                },
            )
            .await
            .expect("create prescription")
    }

    pub async fn approved_prescription(&self, patient_id: i64, medication_id: i64, dosage: &str) -> i64 {
        let id = self.prescription(patient_id, medication_id, dosage).await;
        self.service
            .handle_status(&script(), id, StatusAction::Process, None)
            .await
            .expect("process");
        self.service
            .handle_status(&script(), id, StatusAction::Approve, None)
            .await
            .expect("approve");
        id
    }
}
