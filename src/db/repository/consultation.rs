use rusqlite::{params, Connection, Row};
use serde::Serialize;
use uuid::Uuid;

use super::{from_json_list, to_json_list};
use crate::db::DatabaseError;
use crate::models::Consultation;

/// A consultation joined against the current patient and doctor records.
/// Names here are read-time lookups, not stored values — editing a patient's
/// name changes what every past consultation reports.
#[derive(Debug, Clone, Serialize)]
pub struct ConsultationWithNames {
    #[serde(flatten)]
    pub consultation: Consultation,
    pub patient_name: String,
    pub doctor_name: String,
    pub doctor_specialization: String,
}

const CONSULTATION_COLUMNS: &str = "c.id, c.patient_id, c.doctor_id, c.date, c.diagnosis, \
     c.notes, c.prescriptions, c.hospital, c.follow_up_required, c.created_at";

fn map_consultation(row: &Row) -> rusqlite::Result<Consultation> {
    Ok(Consultation {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        patient_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        doctor_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap_or_default(),
        date: row.get(3)?,
        diagnosis: row.get(4)?,
        notes: row.get(5)?,
        prescriptions: from_json_list(&row.get::<_, String>(6)?),
        hospital: row.get(7)?,
        follow_up_required: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn map_consultation_with_names(row: &Row) -> rusqlite::Result<ConsultationWithNames> {
    Ok(ConsultationWithNames {
        consultation: map_consultation(row)?,
        patient_name: row.get(10)?,
        doctor_name: row.get(11)?,
        doctor_specialization: row.get(12)?,
    })
}

pub fn insert_consultation(
    conn: &Connection,
    consultation: &Consultation,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO consultations (id, patient_id, doctor_id, date, diagnosis, notes, \
         prescriptions, hospital, follow_up_required) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            consultation.id.to_string(),
            consultation.patient_id.to_string(),
            consultation.doctor_id.to_string(),
            consultation.date.to_string(),
            consultation.diagnosis,
            consultation.notes,
            to_json_list(&consultation.prescriptions),
            consultation.hospital,
            consultation.follow_up_required,
        ],
    )?;
    Ok(())
}

pub fn get_consultation(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<Consultation>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONSULTATION_COLUMNS} FROM consultations c WHERE c.id = ?1"
    ))?;
    match stmt.query_row(params![id.to_string()], map_consultation) {
        Ok(c) => Ok(Some(c)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Consultations created by a doctor, optionally narrowed to one patient,
/// joined at read time for current names.
pub fn list_consultations_for_doctor(
    conn: &Connection,
    doctor_id: &Uuid,
    patient_filter: Option<&Uuid>,
) -> Result<Vec<ConsultationWithNames>, DatabaseError> {
    let sql = format!(
        "SELECT {CONSULTATION_COLUMNS}, p.full_name, d.full_name, d.specializations \
         FROM consultations c \
         JOIN patients p ON p.id = c.patient_id \
         JOIN doctors d ON d.id = c.doctor_id \
         WHERE c.doctor_id = ?1 AND (?2 IS NULL OR c.patient_id = ?2) \
         ORDER BY c.date DESC, c.created_at DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![
            doctor_id.to_string(),
            patient_filter.map(|id| id.to_string())
        ],
        map_consultation_with_names,
    )?;
    rows.map(|r| r.map_err(DatabaseError::from))
        .map(|r| r.map(flatten_specializations))
        .collect()
}

/// Consultations for a patient, joined for the doctor's current name and
/// specialization.
pub fn list_consultations_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<ConsultationWithNames>, DatabaseError> {
    let sql = format!(
        "SELECT {CONSULTATION_COLUMNS}, p.full_name, d.full_name, d.specializations \
         FROM consultations c \
         JOIN patients p ON p.id = c.patient_id \
         JOIN doctors d ON d.id = c.doctor_id \
         WHERE c.patient_id = ?1 \
         ORDER BY c.date DESC, c.created_at DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![patient_id.to_string()], map_consultation_with_names)?;
    rows.map(|r| r.map_err(DatabaseError::from))
        .map(|r| r.map(flatten_specializations))
        .collect()
}

/// The doctors column stores a JSON list; listings present it comma-joined
/// like the appointment snapshot does.
fn flatten_specializations(mut row: ConsultationWithNames) -> ConsultationWithNames {
    row.doctor_specialization = from_json_list(&row.doctor_specialization).join(", ");
    row
}
