//! Patients, vitals and treatments.

use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::WardService;
use crate::auth::{authorize, CurrentUser, Role};
use crate::db::queries;
use crate::error::{Result, WardError};
use crate::models::patient::{NewPatient, Patient};
use crate::models::vital::{NewTreatment, NewVital};

const CLINICAL_ROLES: &[Role] = &[Role::Nurse, Role::Sister];

impl WardService {
    /// Registers a patient together with their allergy names.
    #[instrument(skip(self, actor, patient), fields(staff_id = actor.staff_id))]
    pub async fn create_patient(&self, actor: &CurrentUser, patient: NewPatient) -> Result<i64> {
        authorize(actor, &[Role::Admin])?;
        patient.validate()?;

        let mut tx = self.db.pool().begin().await?;
        let id = queries::insert_patient(
            &mut *tx,
            patient.first_name.trim(),
            patient.last_name.trim(),
            self.now(),
        )
        .await?;

        for allergy in patient.allergies.iter().map(|a| a.trim()).filter(|a| !a.is_empty()) {
            queries::attach_allergy(&mut *tx, id, allergy).await?;
        }

        tx.commit().await?;
        info!(patient_id = id, "patient registered");
        Ok(id)
    }

    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn list_patients(&self, actor: &CurrentUser) -> Result<Vec<Patient>> {
        authorize(actor, &[Role::Admin, Role::Nurse, Role::Sister, Role::Doctor])?;

        let mut conn = self.db.pool().acquire().await?;
        Ok(queries::list_patients(&mut *conn).await?)
    }

    #[instrument(skip(self, actor, vital), fields(staff_id = actor.staff_id, patient_id = vital.patient_id))]
    pub async fn record_vital(&self, actor: &CurrentUser, vital: NewVital) -> Result<i64> {
        authorize(actor, CLINICAL_ROLES)?;
        vital.validate()?;

        let mut conn = self.db.pool().acquire().await?;
        queries::find_patient(&mut *conn, vital.patient_id)
            .await?
            .ok_or_else(|| WardError::not_found("patient", vital.patient_id))?;

        let id = queries::insert_vital(&mut *conn, &Uuid::new_v4().to_string(), &vital, actor.staff_id).await?;
        info!(vital_id = id, "vitals recorded");
        Ok(id)
    }

    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn delete_vital(&self, actor: &CurrentUser, vital_id: i64) -> Result<()> {
        authorize(actor, CLINICAL_ROLES)?;

        let mut conn = self.db.pool().acquire().await?;
        if queries::deactivate_vital(&mut *conn, vital_id).await? == 0
            && !queries::vital_exists(&mut *conn, vital_id).await?
        {
            return Err(WardError::not_found("vital", vital_id));
        }
        info!(vital_id, "vitals deactivated");
        Ok(())
    }

    #[instrument(skip(self, actor, treatment), fields(staff_id = actor.staff_id, patient_id = treatment.patient_id))]
    pub async fn record_treatment(&self, actor: &CurrentUser, treatment: NewTreatment) -> Result<i64> {
        authorize(actor, CLINICAL_ROLES)?;
        treatment.validate()?;

        let mut conn = self.db.pool().acquire().await?;
        queries::find_patient(&mut *conn, treatment.patient_id)
            .await?
            .ok_or_else(|| WardError::not_found("patient", treatment.patient_id))?;

        let id = queries::insert_treatment(&mut *conn, &Uuid::new_v4().to_string(), &treatment, actor.staff_id)
            .await?;
        info!(treatment_id = id, "treatment recorded");
        Ok(id)
    }

    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn delete_treatment(&self, actor: &CurrentUser, treatment_id: i64) -> Result<()> {
        authorize(actor, CLINICAL_ROLES)?;

        let mut conn = self.db.pool().acquire().await?;
        if queries::deactivate_treatment(&mut *conn, treatment_id).await? == 0
            && !queries::treatment_exists(&mut *conn, treatment_id).await?
        {
            return Err(WardError::not_found("treatment", treatment_id));
        }
        info!(treatment_id, "treatment deactivated");
        Ok(())
    }
}
