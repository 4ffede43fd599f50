//! Medication stock, wards and beds. Admin only.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use super::WardService;
use crate::auth::{authorize, CurrentUser, Role};
use crate::db::queries;
use crate::error::{Result, WardError};
use crate::models::medication::{Medication, MedicationUpdate, NewMedication};
use crate::models::ward::{Bed, BedCounts, NewBed, NewWard, Ward};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockLine {
    pub medication_id: i64,
    pub name: String,
    pub quantity: i64,
    /// Units whose expiry falls inside the warning window.
    pub expiring_quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReport {
    pub lines: Vec<StockLine>,
    pub low_stock: Vec<String>,
    pub beds: BedCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminDashboard {
    pub beds: BedCounts,
    pub active_wards: i64,
    pub active_medications: i64,
    pub allergies: i64,
}

impl WardService {
    #[instrument(skip(self, actor, medication), fields(staff_id = actor.staff_id))]
    pub async fn create_medication(&self, actor: &CurrentUser, medication: NewMedication) -> Result<i64> {
        authorize(actor, &[Role::Admin])?;
        medication.validate()?;

        let mut conn = self.db.pool().acquire().await?;
        let id = queries::insert_medication(&mut *conn, &medication).await?;
        info!(medication_id = id, name = %medication.name, "medication added");
        Ok(id)
    }

    #[instrument(skip(self, actor, update), fields(staff_id = actor.staff_id))]
    pub async fn update_medication(
        &self,
        actor: &CurrentUser,
        medication_id: i64,
        update: MedicationUpdate,
    ) -> Result<()> {
        authorize(actor, &[Role::Admin])?;
        update.validate()?;

        let mut conn = self.db.pool().acquire().await?;
        if queries::update_medication(&mut *conn, medication_id, &update).await? == 0 {
            return match queries::find_medication(&mut *conn, medication_id).await? {
                Some(_) => Err(WardError::ConcurrencyConflict),
                None => Err(WardError::not_found("medication", medication_id)),
            };
        }

        info!(medication_id, "medication updated");
        Ok(())
    }

    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn delete_medication(&self, actor: &CurrentUser, medication_id: i64) -> Result<()> {
        authorize(actor, &[Role::Admin])?;

        let mut conn = self.db.pool().acquire().await?;
        if queries::soft_delete_medication(&mut *conn, medication_id).await? == 0 {
            return Err(WardError::not_found("medication", medication_id));
        }

        info!(medication_id, "medication removed");
        Ok(())
    }

    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn list_medications(&self, actor: &CurrentUser) -> Result<Vec<Medication>> {
        authorize(actor, &[Role::Admin])?;

        let mut conn = self.db.pool().acquire().await?;
        Ok(queries::list_medications(&mut *conn).await?)
    }

    /// Stock levels, expiring units and bed occupancy.
    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn stock_report(&self, actor: &CurrentUser) -> Result<StockReport> {
        authorize(actor, &[Role::Admin])?;

        let mut conn = self.db.pool().acquire().await?;
        let medications = queries::list_medications(&mut *conn).await?;
        let cutoff = self.now().date() + Duration::days(self.config.expiry_warning_days);
        let expiring = queries::medications_expiring_by(&mut *conn, cutoff).await?;
        let beds = queries::bed_counts(&mut *conn).await?;

        let low_stock = medications
            .iter()
            .filter(|m| m.quantity <= self.config.low_stock_threshold)
            .map(|m| m.name.clone())
            .collect();

        let lines = medications
            .into_iter()
            .map(|m| StockLine {
                expiring_quantity: if expiring.contains(&m.id) { m.quantity } else { 0 },
                medication_id: m.id,
                name: m.name,
                quantity: m.quantity,
            })
            .collect();

        Ok(StockReport { lines, low_stock, beds })
    }

    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn admin_dashboard(&self, actor: &CurrentUser) -> Result<AdminDashboard> {
        authorize(actor, &[Role::Admin])?;

        let mut conn = self.db.pool().acquire().await?;
        Ok(AdminDashboard {
            beds: queries::bed_counts(&mut *conn).await?,
            active_wards: queries::count_active_wards(&mut *conn).await?,
            active_medications: queries::list_medications(&mut *conn).await?.len() as i64,
            allergies: queries::count_allergies(&mut *conn).await?,
        })
    }

    // ===== Wards and beds =====

    #[instrument(skip(self, actor, ward), fields(staff_id = actor.staff_id))]
    pub async fn create_ward(&self, actor: &CurrentUser, ward: NewWard) -> Result<i64> {
        authorize(actor, &[Role::Admin])?;
        ward.validate()?;

        let mut conn = self.db.pool().acquire().await?;
        let id = queries::insert_ward(&mut *conn, ward.name.trim(), ward.capacity).await?;
        info!(ward_id = id, "ward created");
        Ok(id)
    }

    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn list_wards(&self, actor: &CurrentUser) -> Result<Vec<Ward>> {
        authorize(actor, &[Role::Admin])?;

        let mut conn = self.db.pool().acquire().await?;
        Ok(queries::list_wards(&mut *conn).await?)
    }

    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn delete_ward(&self, actor: &CurrentUser, ward_id: i64) -> Result<()> {
        authorize(actor, &[Role::Admin])?;

        let mut conn = self.db.pool().acquire().await?;
        if queries::deactivate_ward(&mut *conn, ward_id).await? == 0 {
            return Err(WardError::not_found("ward", ward_id));
        }
        info!(ward_id, "ward deactivated");
        Ok(())
    }

    #[instrument(skip(self, actor, bed), fields(staff_id = actor.staff_id, ward_id = bed.ward_id))]
    pub async fn create_bed(&self, actor: &CurrentUser, bed: NewBed) -> Result<i64> {
        authorize(actor, &[Role::Admin])?;
        bed.validate()?;

        let mut conn = self.db.pool().acquire().await?;
        queries::find_ward(&mut *conn, bed.ward_id)
            .await?
            .ok_or_else(|| WardError::not_found("ward", bed.ward_id))?;

        let id = queries::insert_bed(&mut *conn, bed.ward_id, bed.bed_no.trim()).await?;
        info!(bed_id = id, "bed added");
        Ok(id)
    }

    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn list_beds(&self, actor: &CurrentUser) -> Result<Vec<Bed>> {
        authorize(actor, &[Role::Admin])?;

        let mut conn = self.db.pool().acquire().await?;
        Ok(queries::list_beds(&mut *conn).await?)
    }

    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn set_bed_occupied(&self, actor: &CurrentUser, bed_id: i64, occupied: bool) -> Result<()> {
        authorize(actor, &[Role::Admin])?;

        let mut conn = self.db.pool().acquire().await?;
        if queries::set_bed_occupied(&mut *conn, bed_id, occupied).await? == 0 {
            return Err(WardError::not_found("bed", bed_id));
        }
        Ok(())
    }

    #[instrument(skip(self, actor), fields(staff_id = actor.staff_id))]
    pub async fn delete_bed(&self, actor: &CurrentUser, bed_id: i64) -> Result<()> {
        authorize(actor, &[Role::Admin])?;

        let mut conn = self.db.pool().acquire().await?;
        if queries::soft_delete_bed(&mut *conn, bed_id).await? == 0 {
            return Err(WardError::not_found("bed", bed_id));
        }
        info!(bed_id, "bed removed");
        Ok(())
    }
}
