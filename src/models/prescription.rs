use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::WardError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PrescriptionStatus {
    New,
    Processing,
    Approved,
    Rejected,
    Forwarded,
}

impl PrescriptionStatus {
    pub const ALL: [PrescriptionStatus; 5] = [
        PrescriptionStatus::New,
        PrescriptionStatus::Processing,
        PrescriptionStatus::Approved,
        PrescriptionStatus::Rejected,
        PrescriptionStatus::Forwarded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrescriptionStatus::New => "New",
            PrescriptionStatus::Processing => "Processing",
            PrescriptionStatus::Approved => "Approved",
            PrescriptionStatus::Rejected => "Rejected",
            PrescriptionStatus::Forwarded => "Forwarded",
        }
    }
}

impl fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrescriptionStatus {
    type Err = WardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrescriptionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| WardError::validation(format!("Unknown prescription status '{}'", s)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Prescription {
    pub id: i64,
    pub patient_id: i64,
    pub issued_by: i64,
    pub status: String, // New, Processing, Approved, Rejected, Forwarded
    pub note: Option<String>,
    pub issued_at: NaiveDateTime,
}

impl Prescription {
    pub fn status(&self) -> Result<PrescriptionStatus, WardError> {
        self.status.parse()
    }

    pub fn is_approved(&self) -> bool {
        matches!(self.status(), Ok(PrescriptionStatus::Approved))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PrescribedLine {
    pub medication_id: i64,
    #[validate(length(min = 1, max = 200, message = "Dosage is required"))]
    pub dosage: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewPrescription {
    pub patient_id: i64,
    pub note: Option<String>,
    #[validate(length(min = 1, message = "A prescription needs at least one medication"))]
    pub lines: Vec<PrescribedLine>,
}

/// Approved prescription usable for one patient and medication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct PrescriptionOption {
    pub prescription_id: i64,
    pub dosage: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    Process,
    Approve,
    Reject,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuickAction {
    ProcessAllNew,
    ApproveAllProcessing,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusCounts {
    pub new: i64,
    pub processing: i64,
    pub approved: i64,
    pub rejected: i64,
    pub forwarded: i64,
}
