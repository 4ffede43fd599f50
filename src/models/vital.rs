use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Vital signs as entered on the ward. Values are kept as typed so that a
/// malformed entry never blocks recording.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vital {
    pub id: i64,
    pub event_id: String,
    pub patient_id: i64,
    pub recorded_at: NaiveDateTime,
    /// "systolic/diastolic", e.g. "120/80".
    pub blood_pressure: Option<String>,
    pub pulse_rate: Option<String>,
    pub sugar_level: Option<String>,
    pub temperature: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewVital {
    pub patient_id: i64,
    pub recorded_at: NaiveDateTime,
    #[validate(length(max = 20))]
    pub blood_pressure: Option<String>,
    #[validate(length(max = 20))]
    pub pulse_rate: Option<String>,
    #[validate(length(max = 20))]
    pub sugar_level: Option<String>,
    #[validate(length(max = 20))]
    pub temperature: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Treatment {
    pub id: i64,
    pub event_id: String,
    pub patient_id: i64,
    pub treatment_type: String,
    pub notes: Option<String>,
    pub performed_at: NaiveDateTime,
    pub recorded_by: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewTreatment {
    pub patient_id: i64,
    #[validate(length(min = 1, max = 200, message = "Treatment type is required"))]
    pub treatment_type: String,
    pub notes: Option<String>,
    pub performed_at: NaiveDateTime,
}
