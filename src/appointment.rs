//! Appointment lifecycle.
//!
//! Creation (either party may book, denormalizing display fields onto the
//! row as a snapshot) and the status state machine. Transitions are
//! forward-only and checked against a central table before anything is
//! persisted:
//!
//! ```text
//! pending  → approved | cancelled
//! approved → completed | cancelled
//! completed, cancelled: terminal
//! ```
//!
//! "Deleting" an appointment is a transition to cancelled; rows are never
//! physically removed.

use chrono::NaiveDate;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{
    get_appointment, get_doctor, get_patient, insert_appointment, update_appointment_status,
};
use crate::db::DatabaseError;
use crate::models::{Appointment, AppointmentStatus, CreatedBy};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Cannot move appointment from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// States reachable from `from` in one step.
pub fn allowed_transitions(from: AppointmentStatus) -> &'static [AppointmentStatus] {
    use AppointmentStatus::*;
    match from {
        Pending => &[Approved, Cancelled],
        Approved => &[Completed, Cancelled],
        Completed | Cancelled => &[],
    }
}

pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Validated creation input. Presence of required fields is checked at the
/// endpoint layer; this carries the result.
#[derive(Debug, Clone)]
pub struct BookingDetails {
    pub appointment_type: String,
    pub date: NaiveDate,
    pub time: String,
    pub reason: String,
    pub notes: Option<String>,
}

/// Book an appointment on behalf of the patient.
pub fn create_by_patient(
    conn: &Connection,
    patient_id: &Uuid,
    doctor_id: &Uuid,
    details: BookingDetails,
) -> Result<Appointment, LifecycleError> {
    create(conn, patient_id, doctor_id, details, CreatedBy::Patient)
}

/// Book an appointment on behalf of the doctor.
pub fn create_by_doctor(
    conn: &Connection,
    doctor_id: &Uuid,
    patient_id: &Uuid,
    details: BookingDetails,
) -> Result<Appointment, LifecycleError> {
    create(conn, patient_id, doctor_id, details, CreatedBy::Doctor)
}

fn create(
    conn: &Connection,
    patient_id: &Uuid,
    doctor_id: &Uuid,
    details: BookingDetails,
    created_by: CreatedBy,
) -> Result<Appointment, LifecycleError> {
    let patient = get_patient(conn, patient_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Patient".into(),
        id: patient_id.to_string(),
    })?;
    let doctor = get_doctor(conn, doctor_id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Doctor".into(),
        id: doctor_id.to_string(),
    })?;

    // Snapshot the display fields at booking time. The specialization list
    // is flattened to a comma-joined string here, not at read time.
    let appointment = Appointment {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        patient_name: patient.full_name,
        patient_phone: patient.phone,
        doctor_id: doctor.id,
        doctor_name: doctor.full_name.clone(),
        doctor_specialization: doctor.specialization_display(),
        hospital_name: doctor.hospital.clone(),
        appointment_type: details.appointment_type,
        date: details.date,
        time: details.time,
        reason: details.reason,
        notes: details.notes,
        status: AppointmentStatus::Pending,
        created_by,
        created_at: chrono::Utc::now().naive_utc(),
        updated_at: chrono::Utc::now().naive_utc(),
    };

    insert_appointment(conn, &appointment)?;

    get_appointment(conn, &appointment.id)?.ok_or_else(|| {
        DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: appointment.id.to_string(),
        }
        .into()
    })
}

/// Move a loaded appointment to a new status, enforcing the transition
/// table. The caller has already authorized the principal against the
/// record. Returns the refreshed row.
pub fn transition(
    conn: &Connection,
    appointment: &Appointment,
    new_status: AppointmentStatus,
    notes: Option<&str>,
) -> Result<Appointment, LifecycleError> {
    if !can_transition(appointment.status, new_status) {
        return Err(LifecycleError::InvalidTransition {
            from: appointment.status.as_str(),
            to: new_status.as_str(),
        });
    }

    update_appointment_status(conn, &appointment.id, new_status, notes)?;

    get_appointment(conn, &appointment.id)?.ok_or_else(|| {
        DatabaseError::NotFound {
            entity_type: "Appointment".into(),
            id: appointment.id.to_string(),
        }
        .into()
    })
}

/// Cancel in place of deletion; legal from any non-terminal state.
pub fn cancel(
    conn: &Connection,
    appointment: &Appointment,
) -> Result<Appointment, LifecycleError> {
    transition(conn, appointment, AppointmentStatus::Cancelled, None)
}
