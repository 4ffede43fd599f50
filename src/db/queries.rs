//! SQL statements for the ward store.
//!
//! Every function takes a plain connection so callers can run several of them
//! inside one transaction (`&mut *tx`) or against a pooled connection.

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::SqliteConnection;

use crate::models::administration::{AdministeredRow, AdministrationRecord, DoseEvent};
use crate::models::medication::{Medication, MedicationUpdate, NewMedication};
use crate::models::patient::Patient;
use crate::models::prescription::{Prescription, PrescriptionOption};
use crate::models::vital::{NewTreatment, NewVital, Treatment, Vital};
use crate::models::ward::{Bed, BedCounts, Ward};

type QueryResult<T> = Result<T, sqlx::Error>;

// ===== Patients =====

pub async fn insert_patient(
    conn: &mut SqliteConnection,
    first_name: &str,
    last_name: &str,
    created_at: NaiveDateTime,
) -> QueryResult<i64> {
    let result = sqlx::query(
        "INSERT INTO patients (first_name, last_name, is_deleted, created_at)
         VALUES (?, ?, 0, ?)",
    )
    .bind(first_name)
    .bind(last_name)
    .bind(created_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Links an allergy to a patient, creating the allergy name on first use.
pub async fn attach_allergy(
    conn: &mut SqliteConnection,
    patient_id: i64,
    allergy_name: &str,
) -> QueryResult<()> {
    sqlx::query("INSERT INTO allergies (name, is_deleted) VALUES (?, 0) ON CONFLICT(name) DO NOTHING")
        .bind(allergy_name)
        .execute(&mut *conn)
        .await?;

    let allergy_id: i64 = sqlx::query_scalar("SELECT id FROM allergies WHERE name = ?")
        .bind(allergy_name)
        .fetch_one(&mut *conn)
        .await?;

    sqlx::query("INSERT OR IGNORE INTO patient_allergies (patient_id, allergy_id) VALUES (?, ?)")
        .bind(patient_id)
        .bind(allergy_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn find_patient(conn: &mut SqliteConnection, id: i64) -> QueryResult<Option<Patient>> {
    sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = ? AND is_deleted = 0")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

/// Active patients in name order.
pub async fn list_patients(conn: &mut SqliteConnection) -> QueryResult<Vec<Patient>> {
    sqlx::query_as::<_, Patient>(
        "SELECT * FROM patients WHERE is_deleted = 0
         ORDER BY first_name, last_name, id",
    )
    .fetch_all(&mut *conn)
    .await
}

pub async fn patient_allergy_names(
    conn: &mut SqliteConnection,
    patient_id: i64,
) -> QueryResult<Vec<String>> {
    sqlx::query_scalar(
        "SELECT a.name FROM patient_allergies pa
         JOIN allergies a ON a.id = pa.allergy_id
         WHERE pa.patient_id = ? AND a.is_deleted = 0
         ORDER BY a.name",
    )
    .bind(patient_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn count_allergies(conn: &mut SqliteConnection) -> QueryResult<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM allergies WHERE is_deleted = 0")
        .fetch_one(&mut *conn)
        .await
}

// ===== Medications =====

pub async fn find_medication(conn: &mut SqliteConnection, id: i64) -> QueryResult<Option<Medication>> {
    sqlx::query_as::<_, Medication>("SELECT * FROM medications WHERE id = ? AND is_deleted = 0")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn list_medications(conn: &mut SqliteConnection) -> QueryResult<Vec<Medication>> {
    sqlx::query_as::<_, Medication>("SELECT * FROM medications WHERE is_deleted = 0 ORDER BY name, id")
        .fetch_all(&mut *conn)
        .await
}

pub async fn insert_medication(conn: &mut SqliteConnection, medication: &NewMedication) -> QueryResult<i64> {
    let result = sqlx::query(
        "INSERT INTO medications (name, schedule, quantity, expiry_date, is_deleted, version)
         VALUES (?, ?, ?, ?, 0, 0)",
    )
    .bind(&medication.name)
    .bind(medication.schedule)
    .bind(medication.quantity)
    .bind(medication.expiry_date)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Returns the number of rows changed; zero means the version moved on or the
/// medication is gone.
pub async fn update_medication(
    conn: &mut SqliteConnection,
    id: i64,
    update: &MedicationUpdate,
) -> QueryResult<u64> {
    let result = sqlx::query(
        "UPDATE medications
         SET name = ?, schedule = ?, quantity = ?, expiry_date = ?, version = version + 1
         WHERE id = ? AND version = ? AND is_deleted = 0",
    )
    .bind(&update.name)
    .bind(update.schedule)
    .bind(update.quantity)
    .bind(update.expiry_date)
    .bind(id)
    .bind(update.version)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn soft_delete_medication(conn: &mut SqliteConnection, id: i64) -> QueryResult<u64> {
    let result = sqlx::query("UPDATE medications SET is_deleted = 1, version = version + 1 WHERE id = ? AND is_deleted = 0")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Takes one unit out of stock if the row is still at `version` and has
/// stock left.
pub async fn decrement_stock(conn: &mut SqliteConnection, id: i64, version: i64) -> QueryResult<u64> {
    let result = sqlx::query(
        "UPDATE medications
         SET quantity = quantity - 1, version = version + 1
         WHERE id = ? AND version = ? AND quantity > 0 AND is_deleted = 0",
    )
    .bind(id)
    .bind(version)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

// ===== Prescriptions =====

pub async fn find_prescription(conn: &mut SqliteConnection, id: i64) -> QueryResult<Option<Prescription>> {
    sqlx::query_as::<_, Prescription>("SELECT * FROM prescriptions WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

/// Whether the prescription carries a line for the medication.
pub async fn prescription_covers(
    conn: &mut SqliteConnection,
    prescription_id: i64,
    medication_id: i64,
) -> QueryResult<bool> {
    sqlx::query_scalar(
        "SELECT EXISTS(
            SELECT 1 FROM prescribed_medications
            WHERE prescription_id = ? AND medication_id = ?
         )",
    )
    .bind(prescription_id)
    .bind(medication_id)
    .fetch_one(&mut *conn)
    .await
}

/// Approved prescriptions of a patient with a line for the medication, with
/// the dosage of the first matching line.
pub async fn approved_prescriptions(
    conn: &mut SqliteConnection,
    patient_id: i64,
    medication_id: i64,
) -> QueryResult<Vec<PrescriptionOption>> {
    let mut options = sqlx::query_as::<_, PrescriptionOption>(
        "SELECT p.id AS prescription_id, pm.dosage AS dosage
         FROM prescriptions p
         JOIN prescribed_medications pm ON pm.prescription_id = p.id
         WHERE p.patient_id = ? AND pm.medication_id = ? AND p.status = 'Approved'
         ORDER BY p.id, pm.id",
    )
    .bind(patient_id)
    .bind(medication_id)
    .fetch_all(&mut *conn)
    .await?;

    options.dedup_by_key(|option| option.prescription_id);
    Ok(options)
}

pub async fn insert_prescription(
    conn: &mut SqliteConnection,
    patient_id: i64,
    issued_by: i64,
    note: Option<&str>,
    issued_at: NaiveDateTime,
) -> QueryResult<i64> {
    let result = sqlx::query(
        "INSERT INTO prescriptions (patient_id, issued_by, status, note, issued_at)
         VALUES (?, ?, 'New', ?, ?)",
    )
    .bind(patient_id)
    .bind(issued_by)
    .bind(note)
    .bind(issued_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn insert_prescribed_line(
    conn: &mut SqliteConnection,
    prescription_id: i64,
    medication_id: i64,
    dosage: &str,
) -> QueryResult<()> {
    sqlx::query(
        "INSERT INTO prescribed_medications (prescription_id, medication_id, dosage)
         VALUES (?, ?, ?)",
    )
    .bind(prescription_id)
    .bind(medication_id)
    .bind(dosage)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn set_prescription_status(conn: &mut SqliteConnection, id: i64, status: &str) -> QueryResult<u64> {
    let result = sqlx::query("UPDATE prescriptions SET status = ? WHERE id = ?")
        .bind(status)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

pub async fn prescription_ids_with_status(conn: &mut SqliteConnection, status: &str) -> QueryResult<Vec<i64>> {
    sqlx::query_scalar("SELECT id FROM prescriptions WHERE status = ? ORDER BY id")
        .bind(status)
        .fetch_all(&mut *conn)
        .await
}

pub async fn insert_forwarding(
    conn: &mut SqliteConnection,
    prescription_id: i64,
    staff_id: i64,
    forwarded_at: NaiveDateTime,
) -> QueryResult<()> {
    sqlx::query(
        "INSERT INTO prescription_forwardings (prescription_id, staff_id, forwarded_at)
         VALUES (?, ?, ?)",
    )
    .bind(prescription_id)
    .bind(staff_id)
    .bind(forwarded_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn insert_rejection(
    conn: &mut SqliteConnection,
    prescription_id: i64,
    staff_id: i64,
    rejected_at: NaiveDateTime,
    reason: Option<&str>,
) -> QueryResult<()> {
    sqlx::query(
        "INSERT INTO prescription_rejections (prescription_id, staff_id, rejected_at, reason)
         VALUES (?, ?, ?, ?)",
    )
    .bind(prescription_id)
    .bind(staff_id)
    .bind(rejected_at)
    .bind(reason)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn count_forwardings(conn: &mut SqliteConnection, prescription_id: i64) -> QueryResult<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM prescription_forwardings WHERE prescription_id = ?")
        .bind(prescription_id)
        .fetch_one(&mut *conn)
        .await
}

/// `(status, count)` pairs for every status present.
pub async fn prescription_status_counts(conn: &mut SqliteConnection) -> QueryResult<Vec<(String, i64)>> {
    sqlx::query_as("SELECT status, COUNT(*) FROM prescriptions GROUP BY status")
        .fetch_all(&mut *conn)
        .await
}

// ===== Administration records =====

pub struct AdministrationInsert<'a> {
    pub event_id: &'a str,
    pub patient_id: i64,
    pub medication_id: i64,
    pub prescription_id: Option<i64>,
    pub dosage: &'a str,
    pub administered_by: i64,
    pub administered_at: NaiveDateTime,
}

pub async fn insert_administration(
    conn: &mut SqliteConnection,
    record: &AdministrationInsert<'_>,
) -> QueryResult<i64> {
    let result = sqlx::query(
        "INSERT INTO administration_records (
            event_id, patient_id, medication_id, prescription_id,
            dosage, administered_by, administered_at, is_active, version
        ) VALUES (?, ?, ?, ?, ?, ?, ?, 1, 0)",
    )
    .bind(record.event_id)
    .bind(record.patient_id)
    .bind(record.medication_id)
    .bind(record.prescription_id)
    .bind(record.dosage)
    .bind(record.administered_by)
    .bind(record.administered_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Looks a record up regardless of its active flag.
pub async fn find_administration(
    conn: &mut SqliteConnection,
    id: i64,
) -> QueryResult<Option<AdministrationRecord>> {
    sqlx::query_as::<_, AdministrationRecord>("SELECT * FROM administration_records WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub struct AdministrationUpdate<'a> {
    pub medication_id: i64,
    pub prescription_id: Option<i64>,
    pub dosage: &'a str,
    pub administered_at: NaiveDateTime,
    pub administered_by: i64,
}

pub async fn update_administration(
    conn: &mut SqliteConnection,
    id: i64,
    version: i64,
    update: &AdministrationUpdate<'_>,
) -> QueryResult<u64> {
    let result = sqlx::query(
        "UPDATE administration_records
         SET medication_id = ?, prescription_id = ?, dosage = ?,
             administered_at = ?, administered_by = ?, version = version + 1
         WHERE id = ? AND version = ? AND is_active = 1",
    )
    .bind(update.medication_id)
    .bind(update.prescription_id)
    .bind(update.dosage)
    .bind(update.administered_at)
    .bind(update.administered_by)
    .bind(id)
    .bind(version)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn deactivate_administration(conn: &mut SqliteConnection, id: i64) -> QueryResult<u64> {
    let result = sqlx::query(
        "UPDATE administration_records SET is_active = 0, version = version + 1
         WHERE id = ? AND is_active = 1",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Active administrations joined with patient and medication names. The
/// search matches the patient name case-insensitively; the window is inclusive.
pub async fn active_administered_rows(
    conn: &mut SqliteConnection,
    search: Option<&str>,
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
) -> QueryResult<Vec<AdministeredRow>> {
    sqlx::query_as::<_, AdministeredRow>(
        "SELECT r.id, r.patient_id,
                p.first_name || ' ' || p.last_name AS patient_name,
                m.name AS medication_name,
                r.dosage, r.administered_by, r.prescription_id, r.administered_at
         FROM administration_records r
         JOIN patients p ON p.id = r.patient_id
         JOIN medications m ON m.id = r.medication_id
         WHERE r.is_active = 1
           AND (? IS NULL OR instr(lower(p.first_name || ' ' || p.last_name), lower(?)) > 0)
           AND (? IS NULL OR r.administered_at >= ?)
           AND (? IS NULL OR r.administered_at <= ?)",
    )
    .bind(search)
    .bind(search)
    .bind(from)
    .bind(from)
    .bind(to)
    .bind(to)
    .fetch_all(&mut *conn)
    .await
}

/// Active administrations of a patient inside the inclusive window.
pub async fn patient_dose_events(
    conn: &mut SqliteConnection,
    patient_id: i64,
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
) -> QueryResult<Vec<DoseEvent>> {
    sqlx::query_as::<_, DoseEvent>(
        "SELECT r.administered_at, m.name AS medication_name, r.dosage
         FROM administration_records r
         JOIN medications m ON m.id = r.medication_id
         WHERE r.patient_id = ? AND r.is_active = 1
           AND (? IS NULL OR r.administered_at >= ?)
           AND (? IS NULL OR r.administered_at <= ?)
         ORDER BY r.administered_at, r.id",
    )
    .bind(patient_id)
    .bind(from)
    .bind(from)
    .bind(to)
    .bind(to)
    .fetch_all(&mut *conn)
    .await
}

// ===== Vitals and treatments =====

pub async fn insert_vital(
    conn: &mut SqliteConnection,
    event_id: &str,
    vital: &NewVital,
    recorded_by: i64,
) -> QueryResult<i64> {
    let result = sqlx::query(
        "INSERT INTO vitals (
            event_id, patient_id, recorded_at, blood_pressure, pulse_rate,
            sugar_level, temperature, notes, recorded_by, is_active
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1)",
    )
    .bind(event_id)
    .bind(vital.patient_id)
    .bind(vital.recorded_at)
    .bind(&vital.blood_pressure)
    .bind(&vital.pulse_rate)
    .bind(&vital.sugar_level)
    .bind(&vital.temperature)
    .bind(&vital.notes)
    .bind(recorded_by)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn deactivate_vital(conn: &mut SqliteConnection, id: i64) -> QueryResult<u64> {
    let result = sqlx::query("UPDATE vitals SET is_active = 0 WHERE id = ? AND is_active = 1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

pub async fn vital_exists(conn: &mut SqliteConnection, id: i64) -> QueryResult<bool> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM vitals WHERE id = ?)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await
}

pub async fn patient_vitals(
    conn: &mut SqliteConnection,
    patient_id: i64,
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
) -> QueryResult<Vec<Vital>> {
    sqlx::query_as::<_, Vital>(
        "SELECT * FROM vitals
         WHERE patient_id = ? AND is_active = 1
           AND (? IS NULL OR recorded_at >= ?)
           AND (? IS NULL OR recorded_at <= ?)
         ORDER BY recorded_at, id",
    )
    .bind(patient_id)
    .bind(from)
    .bind(from)
    .bind(to)
    .bind(to)
    .fetch_all(&mut *conn)
    .await
}

pub async fn insert_treatment(
    conn: &mut SqliteConnection,
    event_id: &str,
    treatment: &NewTreatment,
    recorded_by: i64,
) -> QueryResult<i64> {
    let result = sqlx::query(
        "INSERT INTO treatments (
            event_id, patient_id, treatment_type, notes, performed_at, recorded_by, is_active
        ) VALUES (?, ?, ?, ?, ?, ?, 1)",
    )
    .bind(event_id)
    .bind(treatment.patient_id)
    .bind(&treatment.treatment_type)
    .bind(&treatment.notes)
    .bind(treatment.performed_at)
    .bind(recorded_by)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn deactivate_treatment(conn: &mut SqliteConnection, id: i64) -> QueryResult<u64> {
    let result = sqlx::query("UPDATE treatments SET is_active = 0 WHERE id = ? AND is_active = 1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

pub async fn treatment_exists(conn: &mut SqliteConnection, id: i64) -> QueryResult<bool> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM treatments WHERE id = ?)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await
}

pub async fn patient_treatments(
    conn: &mut SqliteConnection,
    patient_id: i64,
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
) -> QueryResult<Vec<Treatment>> {
    sqlx::query_as::<_, Treatment>(
        "SELECT * FROM treatments
         WHERE patient_id = ? AND is_active = 1
           AND (? IS NULL OR performed_at >= ?)
           AND (? IS NULL OR performed_at <= ?)
         ORDER BY performed_at, id",
    )
    .bind(patient_id)
    .bind(from)
    .bind(from)
    .bind(to)
    .bind(to)
    .fetch_all(&mut *conn)
    .await
}

// ===== Wards and beds =====

pub async fn insert_ward(conn: &mut SqliteConnection, name: &str, capacity: i64) -> QueryResult<i64> {
    let result = sqlx::query("INSERT INTO wards (name, capacity, is_active) VALUES (?, ?, 1)")
        .bind(name)
        .bind(capacity)
        .execute(&mut *conn)
        .await?;

    Ok(result.last_insert_rowid())
}

pub async fn find_ward(conn: &mut SqliteConnection, id: i64) -> QueryResult<Option<Ward>> {
    sqlx::query_as::<_, Ward>("SELECT * FROM wards WHERE id = ? AND is_active = 1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn list_wards(conn: &mut SqliteConnection) -> QueryResult<Vec<Ward>> {
    sqlx::query_as::<_, Ward>("SELECT * FROM wards WHERE is_active = 1 ORDER BY name, id")
        .fetch_all(&mut *conn)
        .await
}

pub async fn deactivate_ward(conn: &mut SqliteConnection, id: i64) -> QueryResult<u64> {
    let result = sqlx::query("UPDATE wards SET is_active = 0 WHERE id = ? AND is_active = 1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

pub async fn count_active_wards(conn: &mut SqliteConnection) -> QueryResult<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM wards WHERE is_active = 1")
        .fetch_one(&mut *conn)
        .await
}

pub async fn insert_bed(conn: &mut SqliteConnection, ward_id: i64, bed_no: &str) -> QueryResult<i64> {
    let result = sqlx::query(
        "INSERT INTO beds (ward_id, bed_no, is_occupied, is_deleted) VALUES (?, ?, 0, 0)",
    )
    .bind(ward_id)
    .bind(bed_no)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn list_beds(conn: &mut SqliteConnection) -> QueryResult<Vec<Bed>> {
    sqlx::query_as::<_, Bed>("SELECT * FROM beds WHERE is_deleted = 0 ORDER BY ward_id, bed_no")
        .fetch_all(&mut *conn)
        .await
}

pub async fn set_bed_occupied(conn: &mut SqliteConnection, id: i64, occupied: bool) -> QueryResult<u64> {
    let result = sqlx::query("UPDATE beds SET is_occupied = ? WHERE id = ? AND is_deleted = 0")
        .bind(occupied)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

pub async fn soft_delete_bed(conn: &mut SqliteConnection, id: i64) -> QueryResult<u64> {
    let result = sqlx::query("UPDATE beds SET is_deleted = 1 WHERE id = ? AND is_deleted = 0")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

pub async fn bed_counts(conn: &mut SqliteConnection) -> QueryResult<BedCounts> {
    let (total, occupied): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(is_occupied), 0) FROM beds WHERE is_deleted = 0",
    )
    .fetch_one(&mut *conn)
    .await?;

    Ok(BedCounts {
        total,
        occupied,
        available: total - occupied,
    })
}

/// Medications whose expiry falls on or before `cutoff`.
pub async fn medications_expiring_by(
    conn: &mut SqliteConnection,
    cutoff: NaiveDate,
) -> QueryResult<Vec<i64>> {
    sqlx::query_scalar(
        "SELECT id FROM medications
         WHERE is_deleted = 0 AND expiry_date IS NOT NULL AND expiry_date <= ?
         ORDER BY id",
    )
    .bind(cutoff)
    .fetch_all(&mut *conn)
    .await
}
