use std::str::FromStr;

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Appointment, AppointmentStatus, CreatedBy};

const APPOINTMENT_COLUMNS: &str = "id, patient_id, patient_name, patient_phone, doctor_id, \
     doctor_name, doctor_specialization, hospital_name, appointment_type, date, time, reason, \
     notes, status, created_by, created_at, updated_at";

fn map_appointment(row: &Row) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        patient_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        patient_name: row.get(2)?,
        patient_phone: row.get(3)?,
        doctor_id: Uuid::parse_str(&row.get::<_, String>(4)?).unwrap_or_default(),
        doctor_name: row.get(5)?,
        doctor_specialization: row.get(6)?,
        hospital_name: row.get(7)?,
        appointment_type: row.get(8)?,
        date: row.get(9)?,
        time: row.get(10)?,
        reason: row.get(11)?,
        notes: row.get(12)?,
        status: AppointmentStatus::from_str(&row.get::<_, String>(13)?)
            .unwrap_or(AppointmentStatus::Pending),
        created_by: CreatedBy::from_str(&row.get::<_, String>(14)?)
            .unwrap_or(CreatedBy::Patient),
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, patient_id, patient_name, patient_phone, doctor_id, \
         doctor_name, doctor_specialization, hospital_name, appointment_type, date, time, \
         reason, notes, status, created_by) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            appt.id.to_string(),
            appt.patient_id.to_string(),
            appt.patient_name,
            appt.patient_phone,
            appt.doctor_id.to_string(),
            appt.doctor_name,
            appt.doctor_specialization,
            appt.hospital_name,
            appt.appointment_type,
            appt.date.to_string(),
            appt.time,
            appt.reason,
            appt.notes,
            appt.status.as_str(),
            appt.created_by.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_appointment(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1"
    ))?;
    match stmt.query_row(params![id.to_string()], map_appointment) {
        Ok(appt) => Ok(Some(appt)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All appointments for a patient, most recent first.
pub fn list_appointments_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE patient_id = ?1 \
         ORDER BY date DESC, created_at DESC"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string()], map_appointment)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// All appointments for a doctor, most recent first.
pub fn list_appointments_for_doctor(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE doctor_id = ?1 \
         ORDER BY date DESC, created_at DESC"
    ))?;
    let rows = stmt.query_map(params![doctor_id.to_string()], map_appointment)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Overwrite the status (and optionally the notes). Transition legality is
/// checked by the lifecycle layer before this is called.
pub fn update_appointment_status(
    conn: &Connection,
    id: &Uuid,
    status: AppointmentStatus,
    notes: Option<&str>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?1, notes = COALESCE(?2, notes), \
         updated_at = CURRENT_TIMESTAMP WHERE id = ?3",
        params![status.as_str(), notes, id.to_string()],
    )?;

    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
