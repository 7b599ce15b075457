use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{from_json_list, to_json_list};
use crate::db::DatabaseError;
use crate::models::{NewPatient, Patient, PatientProfileUpdate};

const PATIENT_COLUMNS: &str = "id, patient_number, full_name, email, password_hash, phone, \
     gender, date_of_birth, blood_group, height, weight, allergies, current_medications, \
     chronic_conditions, emergency_contact_name, emergency_contact_phone, \
     emergency_contact_relation, address_line, city, state, postal_code, country, \
     citizenship_country, national_id, photo_path, id_document_path, created_at, updated_at";

fn map_patient(row: &Row) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        patient_number: row.get(1)?,
        full_name: row.get(2)?,
        email: row.get(3)?,
        password_hash: row.get(4)?,
        phone: row.get(5)?,
        gender: row.get(6)?,
        date_of_birth: row.get(7)?,
        blood_group: row.get(8)?,
        height: row.get(9)?,
        weight: row.get(10)?,
        allergies: from_json_list(&row.get::<_, String>(11)?),
        current_medications: from_json_list(&row.get::<_, String>(12)?),
        chronic_conditions: from_json_list(&row.get::<_, String>(13)?),
        emergency_contact_name: row.get(14)?,
        emergency_contact_phone: row.get(15)?,
        emergency_contact_relation: row.get(16)?,
        address_line: row.get(17)?,
        city: row.get(18)?,
        state: row.get(19)?,
        postal_code: row.get(20)?,
        country: row.get(21)?,
        citizenship_country: row.get(22)?,
        national_id: row.get(23)?,
        photo_path: row.get(24)?,
        id_document_path: row.get(25)?,
        created_at: row.get(26)?,
        updated_at: row.get(27)?,
    })
}

/// Insert a new patient, assigning the next sequential patient number.
///
/// The counter bump and the row insert run in one transaction, so a failed
/// insert (duplicate email) never consumes a number and two registrations
/// can never share one.
pub fn insert_patient(conn: &Connection, new: &NewPatient) -> Result<Patient, DatabaseError> {
    let tx = conn.unchecked_transaction()?;

    let patient_number: i64 = tx.query_row(
        "UPDATE counters SET value = value + 1 WHERE name = 'patient_number' RETURNING value",
        [],
        |row| row.get(0),
    )?;

    let id = Uuid::new_v4();
    tx.execute(
        "INSERT INTO patients (id, patient_number, full_name, email, password_hash, phone, \
         gender, date_of_birth, blood_group, height, weight, allergies, current_medications, \
         chronic_conditions, emergency_contact_name, emergency_contact_phone, \
         emergency_contact_relation, address_line, city, state, postal_code, country, \
         citizenship_country, national_id, photo_path, id_document_path) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
         ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)",
        params![
            id.to_string(),
            patient_number,
            new.full_name,
            new.email,
            new.password_hash,
            new.phone,
            new.gender,
            new.date_of_birth.to_string(),
            new.blood_group,
            new.height,
            new.weight,
            to_json_list(&new.allergies),
            to_json_list(&new.current_medications),
            to_json_list(&new.chronic_conditions),
            new.emergency_contact_name,
            new.emergency_contact_phone,
            new.emergency_contact_relation,
            new.address_line,
            new.city,
            new.state,
            new.postal_code,
            new.country,
            new.citizenship_country,
            new.national_id,
            new.photo_path,
            new.id_document_path,
        ],
    )?;

    tx.commit()?;

    get_patient(conn, &id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Patient".into(),
        id: id.to_string(),
    })
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"
    ))?;
    match stmt.query_row(params![id.to_string()], map_patient) {
        Ok(patient) => Ok(Some(patient)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_patient_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE email = ?1"
    ))?;
    match stmt.query_row(params![email], map_patient) {
        Ok(patient) => Ok(Some(patient)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Double-key lookup backing the patient-ID codec: both the sequence number
/// and the date of birth must match.
pub fn get_patient_by_number_and_dob(
    conn: &Connection,
    patient_number: i64,
    date_of_birth: NaiveDate,
) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients \
         WHERE patient_number = ?1 AND date_of_birth = ?2"
    ))?;
    match stmt.query_row(
        params![patient_number, date_of_birth.to_string()],
        map_patient,
    ) {
        Ok(patient) => Ok(Some(patient)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Apply a whitelisted profile update. Absent fields keep their values;
/// last write wins.
pub fn update_patient_profile(
    conn: &Connection,
    id: &Uuid,
    update: &PatientProfileUpdate,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET \
         full_name = COALESCE(?1, full_name), \
         phone = COALESCE(?2, phone), \
         gender = COALESCE(?3, gender), \
         blood_group = COALESCE(?4, blood_group), \
         height = COALESCE(?5, height), \
         weight = COALESCE(?6, weight), \
         allergies = COALESCE(?7, allergies), \
         current_medications = COALESCE(?8, current_medications), \
         chronic_conditions = COALESCE(?9, chronic_conditions), \
         emergency_contact_name = COALESCE(?10, emergency_contact_name), \
         emergency_contact_phone = COALESCE(?11, emergency_contact_phone), \
         emergency_contact_relation = COALESCE(?12, emergency_contact_relation), \
         address_line = COALESCE(?13, address_line), \
         city = COALESCE(?14, city), \
         state = COALESCE(?15, state), \
         postal_code = COALESCE(?16, postal_code), \
         country = COALESCE(?17, country), \
         updated_at = CURRENT_TIMESTAMP \
         WHERE id = ?18",
        params![
            update.full_name,
            update.phone,
            update.gender,
            update.blood_group,
            update.height,
            update.weight,
            update.allergies.as_ref().map(|v| to_json_list(v)),
            update.current_medications.as_ref().map(|v| to_json_list(v)),
            update.chronic_conditions.as_ref().map(|v| to_json_list(v)),
            update.emergency_contact_name,
            update.emergency_contact_phone,
            update.emergency_contact_relation,
            update.address_line,
            update.city,
            update.state,
            update.postal_code,
            update.country,
            id.to_string(),
        ],
    )?;

    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Patient".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
