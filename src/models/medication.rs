use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Medication {
    pub id: i64,
    pub name: String,
    /// Regulatory control tier; higher is more controlled.
    pub schedule: i64,
    /// Units left in stock, never negative.
    pub quantity: i64,
    pub expiry_date: Option<NaiveDate>,
    pub is_deleted: bool,
    pub version: i64,
}

impl Medication {
    pub fn display_name(&self) -> String {
        format!("{} (Schedule {})", self.name, self.schedule)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewMedication {
    #[validate(length(min = 1, max = 200, message = "Medication name is required"))]
    pub name: String,
    #[validate(range(min = 0, max = 8, message = "Schedule must be between 0 and 8"))]
    pub schedule: i64,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i64,
    pub expiry_date: Option<NaiveDate>,
}

/// Full replacement of a medication's editable fields. `version` must match
/// the stored row.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MedicationUpdate {
    #[validate(length(min = 1, max = 200, message = "Medication name is required"))]
    pub name: String,
    #[validate(range(min = 0, max = 8, message = "Schedule must be between 0 and 8"))]
    pub schedule: i64,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i64,
    pub expiry_date: Option<NaiveDate>,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationOption {
    pub id: i64,
    pub display_name: String,
}

impl From<&Medication> for MedicationOption {
    fn from(medication: &Medication) -> Self {
        Self {
            id: medication.id,
            display_name: medication.display_name(),
        }
    }
}
