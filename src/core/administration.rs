//! Medication administration: the gate every administration attempt passes
//! through, plus edit, soft delete and the listing used by the ward.

use sqlx::SqliteConnection;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::WardService;
use crate::auth::{authorize, CurrentUser, Role};
use crate::db::queries::{self, AdministrationInsert, AdministrationUpdate};
use crate::error::{Result, WardError};
use crate::models::administration::{
    AdministerRequest, AdministeredFilter, AdministeredRow, AdministeredSort, AdministrationForm,
    EditAdministrationRequest,
};
use crate::models::medication::{Medication, MedicationOption};
use crate::models::prescription::PrescriptionOption;

const ADMINISTERING_ROLES: &[Role] = &[Role::Nurse, Role::Sister];

const ALLERGY_MESSAGE: &str = "This medication may cause an allergic reaction! Cannot administer.";
const OUT_OF_STOCK_MESSAGE: &str = "Medication is out of stock!";
const PRESCRIPTION_MISMATCH_MESSAGE: &str =
    "The selected prescription is not approved or doesn't match the medication.";

/// Returns the first allergy whose name occurs, ignoring case, anywhere in the
/// medication name. Blank allergy names never match.
pub fn allergy_conflict<'a>(medication_name: &str, allergies: &'a [String]) -> Option<&'a str> {
    let medication = medication_name.to_lowercase();
    allergies.iter().map(String::as_str).find(|allergy| {
        let allergy = allergy.trim();
        !allergy.is_empty() && medication.contains(&allergy.to_lowercase())
    })
}

impl WardService {
    fn requires_prescription(&self, medication: &Medication) -> bool {
        medication.schedule > self.config.schedule_threshold
    }

    /// Schedule gate. Returns the prescription to link, or `None` when the
    /// medication is not gated (a supplied prescription is then dropped).
    /// Rule violations are pushed onto `violations`.
    async fn check_prescription(
        &self,
        conn: &mut SqliteConnection,
        actor: &CurrentUser,
        medication: &Medication,
        patient_id: i64,
        prescription_id: Option<i64>,
        violations: &mut Vec<String>,
    ) -> Result<Option<i64>> {
        let threshold = self.config.schedule_threshold;
        if !self.requires_prescription(medication) {
            return Ok(None);
        }

        if actor.role == Role::Nurse {
            violations.push(format!(
                "You cannot administer medication with a schedule higher than {}.",
                threshold
            ));
            return Ok(None);
        }

        let Some(prescription_id) = prescription_id else {
            violations.push(format!(
                "A prescription is required for Schedule {} and above medications.",
                threshold + 1
            ));
            return Ok(None);
        };

        let valid = match queries::find_prescription(&mut *conn, prescription_id).await? {
            Some(prescription) => {
                prescription.is_approved()
                    && prescription.patient_id == patient_id
                    && queries::prescription_covers(&mut *conn, prescription_id, medication.id).await?
            }
            None => false,
        };

        if valid {
            Ok(Some(prescription_id))
        } else {
            violations.push(PRESCRIPTION_MISMATCH_MESSAGE.to_string());
            Ok(None)
        }
    }

    /// Validates an administration attempt and, when every rule passes,
    /// takes one unit out of stock and writes the record in one transaction.
    #[instrument(
        skip(self, actor, request),
        fields(staff_id = actor.staff_id, patient_id = request.patient_id, medication_id = request.medication_id)
    )]
    pub async fn record_administration(
        &self,
        actor: &CurrentUser,
        request: AdministerRequest,
    ) -> Result<i64> {
        authorize(actor, ADMINISTERING_ROLES)?;
        request.validate()?;

        let mut tx = self.db.pool().begin().await?;

        queries::find_patient(&mut *tx, request.patient_id)
            .await?
            .ok_or_else(|| WardError::not_found("patient", request.patient_id))?;

        let medication = queries::find_medication(&mut *tx, request.medication_id)
            .await?
            .ok_or_else(|| WardError::not_found("medication", request.medication_id))?;

        let mut violations = Vec::new();
        let prescription_id = self
            .check_prescription(
                &mut *tx,
                actor,
                &medication,
                request.patient_id,
                request.prescription_id,
                &mut violations,
            )
            .await?;

        let allergies = queries::patient_allergy_names(&mut *tx, request.patient_id).await?;
        if let Some(allergy) = allergy_conflict(&medication.name, &allergies) {
            warn!(allergy, medication = %medication.name, "allergy conflict");
            violations.push(ALLERGY_MESSAGE.to_string());
        }

        if !violations.is_empty() {
            warn!(?violations, "administration rejected");
            return Err(WardError::Validation(violations));
        }

        if medication.quantity <= 0 {
            warn!(medication = %medication.name, "out of stock");
            return Err(WardError::validation(OUT_OF_STOCK_MESSAGE));
        }

        if queries::decrement_stock(&mut *tx, medication.id, medication.version).await? == 0 {
            return Err(WardError::ConcurrencyConflict);
        }

        let event_id = Uuid::new_v4().to_string();
        let record_id = queries::insert_administration(
            &mut *tx,
            &AdministrationInsert {
                event_id: &event_id,
                patient_id: request.patient_id,
                medication_id: medication.id,
                prescription_id,
                dosage: &request.dosage,
                administered_by: actor.staff_id,
                administered_at: self.now(),
            },
        )
        .await?;

        tx.commit().await?;

        info!(record_id, %event_id, remaining = medication.quantity - 1, "medication administered");
        Ok(record_id)
    }

    /// Re-checks existence and the schedule gate for the new selection. Stock
    /// and allergies are not re-checked. Moving to a medication at or below
    /// the threshold clears any prescription link.
    #[instrument(skip(self, actor, request), fields(staff_id = actor.staff_id))]
    pub async fn edit_administration(
        &self,
        actor: &CurrentUser,
        record_id: i64,
        request: EditAdministrationRequest,
    ) -> Result<()> {
        authorize(actor, ADMINISTERING_ROLES)?;
        request.validate()?;

        let mut tx = self.db.pool().begin().await?;

        let record = queries::find_administration(&mut *tx, record_id)
            .await?
            .filter(|record| record.is_active)
            .ok_or_else(|| WardError::not_found("administration record", record_id))?;

        if request.expected_version.is_some_and(|version| version != record.version) {
            return Err(WardError::ConcurrencyConflict);
        }

        let medication = queries::find_medication(&mut *tx, request.medication_id)
            .await?
            .ok_or_else(|| WardError::not_found("medication", request.medication_id))?;

        let mut violations = Vec::new();
        let prescription_id = self
            .check_prescription(
                &mut *tx,
                actor,
                &medication,
                record.patient_id,
                request.prescription_id,
                &mut violations,
            )
            .await?;

        if !violations.is_empty() {
            warn!(?violations, "edit rejected");
            return Err(WardError::Validation(violations));
        }

        if record.prescription_id.is_some() && prescription_id.is_none() {
            info!(
                previous = ?record.prescription_id,
                schedule = medication.schedule,
                "prescription link cleared"
            );
        }

        let changed = queries::update_administration(
            &mut *tx,
            record.id,
            record.version,
            &AdministrationUpdate {
                medication_id: medication.id,
                prescription_id,
                dosage: &request.dosage,
                administered_at: request.administered_at,
                administered_by: actor.staff_id,
            },
        )
        .await?;

        if changed == 0 {
            return Err(WardError::ConcurrencyConflict);
        }

        tx.commit().await?;
        info!("administration record updated");
        Ok(())
    }

    /// Soft delete. Stock is deliberately left as it is.
    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn delete_administration(&self, actor: &CurrentUser, record_id: i64) -> Result<()> {
        authorize(actor, ADMINISTERING_ROLES)?;

        let mut conn = self.db.pool().acquire().await?;
        if queries::deactivate_administration(&mut *conn, record_id).await? == 0
            && queries::find_administration(&mut *conn, record_id).await?.is_none()
        {
            return Err(WardError::not_found("administration record", record_id));
        }

        info!(record_id, "administration record deactivated");
        Ok(())
    }

    /// Data for the administer form of one patient, optionally with a
    /// medication already picked.
    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn administration_form(
        &self,
        actor: &CurrentUser,
        patient_id: i64,
        medication_id: Option<i64>,
    ) -> Result<AdministrationForm> {
        authorize(actor, ADMINISTERING_ROLES)?;

        let mut conn = self.db.pool().acquire().await?;
        let patient = queries::find_patient(&mut *conn, patient_id)
            .await?
            .ok_or_else(|| WardError::not_found("patient", patient_id))?;
        let allergies = queries::patient_allergy_names(&mut *conn, patient_id).await?;
        let medications = queries::list_medications(&mut *conn).await?;

        let mut form = AdministrationForm {
            patient_id,
            patient_name: patient.full_name(),
            allergies,
            medications: medications.iter().map(MedicationOption::from).collect(),
            selected_medication_id: None,
            requires_prescription: false,
            prescriptions: Vec::new(),
            selected_prescription_id: None,
            prescribed_dosage: None,
            warning: None,
        };

        let selected = medication_id.and_then(|id| medications.iter().find(|m| m.id == id));
        if let Some(medication) = selected {
            form.selected_medication_id = Some(medication.id);

            if self.requires_prescription(medication) {
                form.requires_prescription = true;
                form.prescriptions =
                    queries::approved_prescriptions(&mut *conn, patient_id, medication.id).await?;

                match form.prescriptions.as_slice() {
                    [only] => {
                        form.selected_prescription_id = Some(only.prescription_id);
                        form.prescribed_dosage = Some(only.dosage.clone());
                    }
                    [] => {
                        form.warning = Some(
                            "Cannot administer - no approved prescription found for this medication."
                                .to_string(),
                        );
                    }
                    _ => {}
                }
            }
        }

        Ok(form)
    }

    /// Approved prescriptions of the patient that cover the medication.
    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn approved_prescriptions(
        &self,
        actor: &CurrentUser,
        patient_id: i64,
        medication_id: i64,
    ) -> Result<Vec<PrescriptionOption>> {
        authorize(actor, ADMINISTERING_ROLES)?;

        let mut conn = self.db.pool().acquire().await?;
        Ok(queries::approved_prescriptions(&mut *conn, patient_id, medication_id).await?)
    }

    /// Active administrations, filtered and sorted for the ward listing.
    #[instrument(skip(self, actor, filter), fields(staff_id = actor.staff_id))]
    pub async fn list_administered(
        &self,
        actor: &CurrentUser,
        filter: &AdministeredFilter,
    ) -> Result<Vec<AdministeredRow>> {
        authorize(actor, ADMINISTERING_ROLES)?;

        let mut conn = self.db.pool().acquire().await?;
        let search = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let mut rows = queries::active_administered_rows(&mut *conn, search, filter.from, filter.to).await?;

        sort_administered(&mut rows, filter.sort);
        Ok(rows)
    }
}

fn sort_administered(rows: &mut [AdministeredRow], sort: AdministeredSort) {
    match sort {
        AdministeredSort::Name => {
            rows.sort_by(|a, b| a.patient_name.cmp(&b.patient_name).then(a.id.cmp(&b.id)))
        }
        AdministeredSort::NameDesc => {
            rows.sort_by(|a, b| b.patient_name.cmp(&a.patient_name).then(a.id.cmp(&b.id)))
        }
        AdministeredSort::Date => {
            rows.sort_by(|a, b| a.administered_at.cmp(&b.administered_at).then(a.id.cmp(&b.id)))
        }
        AdministeredSort::DateDesc => {
            rows.sort_by(|a, b| b.administered_at.cmp(&a.administered_at).then(a.id.cmp(&b.id)))
        }
    }
}
