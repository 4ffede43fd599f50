use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Patient {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub is_deleted: bool,
    pub created_at: NaiveDateTime,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPatient {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    /// Free-text allergy names, e.g. "Penicillin".
    #[serde(default)]
    pub allergies: Vec<String>,
}

/// Dropdown entry for patient pickers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientOption {
    pub id: i64,
    pub name: String,
}

impl From<&Patient> for PatientOption {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.full_name(),
        }
    }
}
