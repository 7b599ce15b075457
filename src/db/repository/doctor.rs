use std::str::FromStr;

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::{from_json_list, to_json_list};
use crate::db::DatabaseError;
use crate::models::{Doctor, DoctorProfileUpdate, NewDoctor, VerificationStatus};

const DOCTOR_COLUMNS: &str = "id, full_name, email, password_hash, phone, gender, \
     date_of_birth, license_number, specializations, years_of_experience, hospital, \
     qualifications, available_days, consultation_fee, payment_methods, address_line, city, \
     state, postal_code, country, citizenship_country, national_id, license_document_path, \
     degree_document_path, id_document_path, photo_path, is_verified, verification_status, \
     created_at, updated_at";

fn map_doctor(row: &Row) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        full_name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        phone: row.get(4)?,
        gender: row.get(5)?,
        date_of_birth: row.get(6)?,
        license_number: row.get(7)?,
        specializations: from_json_list(&row.get::<_, String>(8)?),
        years_of_experience: row.get(9)?,
        hospital: row.get(10)?,
        qualifications: row.get(11)?,
        available_days: from_json_list(&row.get::<_, String>(12)?),
        consultation_fee: row.get(13)?,
        payment_methods: from_json_list(&row.get::<_, String>(14)?),
        address_line: row.get(15)?,
        city: row.get(16)?,
        state: row.get(17)?,
        postal_code: row.get(18)?,
        country: row.get(19)?,
        citizenship_country: row.get(20)?,
        national_id: row.get(21)?,
        license_document_path: row.get(22)?,
        degree_document_path: row.get(23)?,
        id_document_path: row.get(24)?,
        photo_path: row.get(25)?,
        is_verified: row.get(26)?,
        verification_status: VerificationStatus::from_str(&row.get::<_, String>(27)?)
            .unwrap_or(VerificationStatus::Pending),
        created_at: row.get(28)?,
        updated_at: row.get(29)?,
    })
}

/// Insert a newly registered doctor. Verification always starts at
/// pending/unverified regardless of the input.
pub fn insert_doctor(conn: &Connection, new: &NewDoctor) -> Result<Doctor, DatabaseError> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO doctors (id, full_name, email, password_hash, phone, gender, \
         date_of_birth, license_number, specializations, years_of_experience, hospital, \
         qualifications, available_days, consultation_fee, payment_methods, address_line, \
         city, state, postal_code, country, citizenship_country, national_id, \
         license_document_path, degree_document_path, id_document_path, photo_path) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
         ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)",
        params![
            id.to_string(),
            new.full_name,
            new.email,
            new.password_hash,
            new.phone,
            new.gender,
            new.date_of_birth.map(|d| d.to_string()),
            new.license_number,
            to_json_list(&new.specializations),
            new.years_of_experience,
            new.hospital,
            new.qualifications,
            to_json_list(&new.available_days),
            new.consultation_fee,
            to_json_list(&new.payment_methods),
            new.address_line,
            new.city,
            new.state,
            new.postal_code,
            new.country,
            new.citizenship_country,
            new.national_id,
            new.license_document_path,
            new.degree_document_path,
            new.id_document_path,
            new.photo_path,
        ],
    )?;

    get_doctor(conn, &id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Doctor".into(),
        id: id.to_string(),
    })
}

pub fn get_doctor(conn: &Connection, id: &Uuid) -> Result<Option<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1"
    ))?;
    match stmt.query_row(params![id.to_string()], map_doctor) {
        Ok(doctor) => Ok(Some(doctor)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_doctor_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<Doctor>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE email = ?1"
    ))?;
    match stmt.query_row(params![email], map_doctor) {
        Ok(doctor) => Ok(Some(doctor)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Apply a whitelisted profile update. Verification fields are untouchable
/// here; `update_doctor_verification` is the only writer for that pair.
pub fn update_doctor_profile(
    conn: &Connection,
    id: &Uuid,
    update: &DoctorProfileUpdate,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctors SET \
         full_name = COALESCE(?1, full_name), \
         phone = COALESCE(?2, phone), \
         gender = COALESCE(?3, gender), \
         specializations = COALESCE(?4, specializations), \
         years_of_experience = COALESCE(?5, years_of_experience), \
         hospital = COALESCE(?6, hospital), \
         qualifications = COALESCE(?7, qualifications), \
         available_days = COALESCE(?8, available_days), \
         consultation_fee = COALESCE(?9, consultation_fee), \
         payment_methods = COALESCE(?10, payment_methods), \
         address_line = COALESCE(?11, address_line), \
         city = COALESCE(?12, city), \
         state = COALESCE(?13, state), \
         postal_code = COALESCE(?14, postal_code), \
         country = COALESCE(?15, country), \
         updated_at = CURRENT_TIMESTAMP \
         WHERE id = ?16",
        params![
            update.full_name,
            update.phone,
            update.gender,
            update.specializations.as_ref().map(|v| to_json_list(v)),
            update.years_of_experience,
            update.hospital,
            update.qualifications,
            update.available_days.as_ref().map(|v| to_json_list(v)),
            update.consultation_fee,
            update.payment_methods.as_ref().map(|v| to_json_list(v)),
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
            entity_type: "Doctor".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Set the verification pair in one statement, keeping the invariant
/// `is_verified == (status == approved)` by construction.
pub fn update_doctor_verification(
    conn: &Connection,
    id: &Uuid,
    status: VerificationStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE doctors SET verification_status = ?1, is_verified = ?2, \
         updated_at = CURRENT_TIMESTAMP WHERE id = ?3",
        params![
            status.as_str(),
            status == VerificationStatus::Approved,
            id.to_string(),
        ],
    )?;

    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Doctor".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
