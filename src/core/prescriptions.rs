//! Prescription issue and the scripting status workflow.

use tracing::{info, instrument, warn};
use validator::Validate;

use super::WardService;
use crate::auth::{authorize, CurrentUser, Role};
use crate::db::queries;
use crate::error::{Result, WardError};
use crate::models::prescription::{
    NewPrescription, PrescriptionStatus, QuickAction, StatusAction, StatusCounts,
};

const NOT_PROCESSED_MESSAGE: &str = "Prescription has to be processed before any actions.";

/// Status a prescription moves to, or `None` when the action is not allowed
/// from `current`.
pub fn next_status(current: PrescriptionStatus, action: StatusAction) -> Option<PrescriptionStatus> {
    match (action, current) {
        (StatusAction::Process, _) => Some(PrescriptionStatus::Processing),
        (StatusAction::Approve, PrescriptionStatus::Processing) => Some(PrescriptionStatus::Approved),
        (StatusAction::Reject, PrescriptionStatus::Processing) => Some(PrescriptionStatus::Rejected),
        _ => None,
    }
}

impl WardService {
    /// Issues a prescription in status New.
    #[instrument(skip(self, actor, prescription), fields(staff_id = actor.staff_id, patient_id = prescription.patient_id))]
    pub async fn create_prescription(
        &self,
        actor: &CurrentUser,
        prescription: NewPrescription,
    ) -> Result<i64> {
        authorize(actor, &[Role::Doctor])?;
        prescription.validate()?;
        for line in &prescription.lines {
            line.validate()?;
        }

        let mut tx = self.db.pool().begin().await?;

        queries::find_patient(&mut *tx, prescription.patient_id)
            .await?
            .ok_or_else(|| WardError::not_found("patient", prescription.patient_id))?;

        for line in &prescription.lines {
            queries::find_medication(&mut *tx, line.medication_id)
                .await?
                .ok_or_else(|| WardError::not_found("medication", line.medication_id))?;
        }

        let id = queries::insert_prescription(
            &mut *tx,
            prescription.patient_id,
            actor.staff_id,
            prescription.note.as_deref(),
            self.now(),
        )
        .await?;

        for line in &prescription.lines {
            queries::insert_prescribed_line(&mut *tx, id, line.medication_id, line.dosage.trim()).await?;
        }

        tx.commit().await?;
        info!(prescription_id = id, lines = prescription.lines.len(), "prescription issued");
        Ok(id)
    }

    /// Applies one status action. Approvals record a forwarding and
    /// rejections record the reason.
    #[instrument(skip(self, actor, reason), fields(staff_id = actor.staff_id))]
    pub async fn handle_status(
        &self,
        actor: &CurrentUser,
        prescription_id: i64,
        action: StatusAction,
        reason: Option<String>,
    ) -> Result<PrescriptionStatus> {
        authorize(actor, &[Role::Script])?;

        let mut tx = self.db.pool().begin().await?;
        let prescription = queries::find_prescription(&mut *tx, prescription_id)
            .await?
            .ok_or_else(|| WardError::not_found("prescription", prescription_id))?;

        let current = prescription.status()?;
        let Some(next) = next_status(current, action) else {
            warn!(%current, ?action, "status action refused");
            return Err(WardError::validation(NOT_PROCESSED_MESSAGE));
        };

        queries::set_prescription_status(&mut *tx, prescription_id, next.as_str()).await?;
        let now = self.now();
        match next {
            PrescriptionStatus::Approved => {
                queries::insert_forwarding(&mut *tx, prescription_id, actor.staff_id, now).await?;
            }
            PrescriptionStatus::Rejected => {
                let reason = reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
                queries::insert_rejection(&mut *tx, prescription_id, actor.staff_id, now, reason).await?;
            }
            _ => {}
        }

        tx.commit().await?;
        info!(%current, %next, "prescription status changed");
        Ok(next)
    }

    /// Bulk transition. Returns the ids that were moved.
    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn quick_action(&self, actor: &CurrentUser, action: QuickAction) -> Result<Vec<i64>> {
        authorize(actor, &[Role::Script])?;

        let (from, to) = match action {
            QuickAction::ProcessAllNew => (PrescriptionStatus::New, PrescriptionStatus::Processing),
            QuickAction::ApproveAllProcessing => {
                (PrescriptionStatus::Processing, PrescriptionStatus::Approved)
            }
        };

        let mut tx = self.db.pool().begin().await?;
        let ids = queries::prescription_ids_with_status(&mut *tx, from.as_str()).await?;
        let now = self.now();

        for &id in &ids {
            queries::set_prescription_status(&mut *tx, id, to.as_str()).await?;
            if to == PrescriptionStatus::Approved {
                queries::insert_forwarding(&mut *tx, id, actor.staff_id, now).await?;
            }
        }

        tx.commit().await?;
        info!(moved = ids.len(), %from, %to, "bulk status change");
        Ok(ids)
    }

    /// Number of prescriptions per status.
    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn status_counts(&self, actor: &CurrentUser) -> Result<StatusCounts> {
        authorize(actor, &[Role::Script])?;

        let mut conn = self.db.pool().acquire().await?;
        let mut counts = StatusCounts::default();
        for (status, count) in queries::prescription_status_counts(&mut *conn).await? {
            match status.parse::<PrescriptionStatus>() {
                Ok(PrescriptionStatus::New) => counts.new = count,
                Ok(PrescriptionStatus::Processing) => counts.processing = count,
                Ok(PrescriptionStatus::Approved) => counts.approved = count,
                Ok(PrescriptionStatus::Rejected) => counts.rejected = count,
                Ok(PrescriptionStatus::Forwarded) => counts.forwarded = count,
                Err(_) => warn!(%status, "unknown prescription status in store"),
            }
        }
        Ok(counts)
    }
}
