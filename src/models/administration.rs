use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::medication::MedicationOption;
use super::prescription::PrescriptionOption;

/// One medication-administration event. Immutable history; edits only touch
/// medication, dosage, date and prescription link, deletes flip `is_active`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdministrationRecord {
    pub id: i64,
    pub event_id: String,
    pub patient_id: i64,
    pub medication_id: i64,
    pub prescription_id: Option<i64>,
    pub dosage: String,
    pub administered_by: i64,
    pub administered_at: NaiveDateTime,
    pub is_active: bool,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdministerRequest {
    pub patient_id: i64,
    pub medication_id: i64,
    pub prescription_id: Option<i64>,
    #[validate(length(min = 1, max = 200, message = "Dosage is required"))]
    pub dosage: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EditAdministrationRequest {
    pub medication_id: i64,
    pub prescription_id: Option<i64>,
    #[validate(length(min = 1, max = 200, message = "Dosage is required"))]
    pub dosage: String,
    pub administered_at: NaiveDateTime,
    /// Version the client loaded; a mismatch is reported as a conflict.
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Everything a client needs to render the administer form, returned
/// explicitly instead of through side channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdministrationForm {
    pub patient_id: i64,
    pub patient_name: String,
    pub allergies: Vec<String>,
    pub medications: Vec<MedicationOption>,
    pub selected_medication_id: Option<i64>,
    pub requires_prescription: bool,
    pub prescriptions: Vec<PrescriptionOption>,
    pub selected_prescription_id: Option<i64>,
    pub prescribed_dosage: Option<String>,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdministeredSort {
    #[default]
    Name,
    NameDesc,
    Date,
    DateDesc,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdministeredFilter {
    pub search: Option<String>,
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
    #[serde(default)]
    pub sort: AdministeredSort,
}

/// Listing row joined with patient and medication names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct AdministeredRow {
    pub id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub medication_name: String,
    pub dosage: String,
    pub administered_by: i64,
    pub prescription_id: Option<i64>,
    pub administered_at: NaiveDateTime,
}

/// Administration as plotted on a patient timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct DoseEvent {
    pub administered_at: NaiveDateTime,
    pub medication_name: String,
    pub dosage: String,
}
