//! Domain records persisted by the ward store, plus the request payloads that
//! create or change them.

pub mod administration;
pub mod medication;
pub mod patient;
pub mod prescription;
pub mod vital;
pub mod ward;

pub use administration::{AdministeredRow, AdministrationRecord, DoseEvent};
pub use medication::Medication;
pub use patient::Patient;
pub use prescription::{Prescription, PrescriptionStatus};
pub use vital::{Treatment, Vital};
pub use ward::{Bed, Ward};
