//! Consultation linker.
//!
//! A doctor records a consultation against a patient identified by the
//! patient-ID codec (display identifier or raw key). Only the resolved
//! primary keys and clinical fields are persisted; names shown on listings
//! are joined at read time, so they always reflect the current patient and
//! doctor records. This is the opposite policy from appointments, which
//! freeze names at booking time, and the asymmetry is intentional.

use chrono::NaiveDate;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{get_consultation, get_doctor, insert_consultation};
use crate::db::DatabaseError;
use crate::models::Consultation;
use crate::patient_id;

/// Validated creation input; the patient side arrives as the raw string the
/// doctor typed, resolved through the codec here.
#[derive(Debug, Clone)]
pub struct ConsultationDetails {
    pub date: NaiveDate,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub prescriptions: Option<Vec<String>>,
    pub hospital: Option<String>,
    pub follow_up_required: Option<bool>,
}

/// The created consultation plus the patient's current full name (a fresh
/// read at creation time, not a stored value).
#[derive(Debug, Clone)]
pub struct CreatedConsultation {
    pub consultation: Consultation,
    pub patient_name: String,
}

/// Record a consultation. The role gate has already been applied; the
/// doctor id always comes from the authenticated principal, never the
/// payload.
pub fn create(
    conn: &Connection,
    doctor_id: &Uuid,
    patient_id_input: &str,
    details: ConsultationDetails,
) -> Result<CreatedConsultation, DatabaseError> {
    let patient = patient_id::resolve(conn, patient_id_input)?;

    // Defensive: the principal came from a verified token, but the row may
    // have been removed since issuance.
    let doctor = get_doctor(conn, doctor_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Doctor".into(),
        id: doctor_id.to_string(),
    })?;

    let consultation = Consultation {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        doctor_id: doctor.id,
        date: details.date,
        diagnosis: details.diagnosis,
        notes: details.notes,
        prescriptions: details.prescriptions.unwrap_or_default(),
        hospital: details.hospital,
        follow_up_required: details.follow_up_required.unwrap_or(false),
        created_at: chrono::Utc::now().naive_utc(),
    };

    insert_consultation(conn, &consultation)?;

    let consultation = get_consultation(conn, &consultation.id)?.ok_or_else(|| {
        DatabaseError::NotFound {
            entity_type: "Consultation".into(),
            id: consultation.id.to_string(),
        }
    })?;

    Ok(CreatedConsultation {
        consultation,
        patient_name: patient.full_name,
    })
}
