use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AppointmentStatus, CreatedBy};

/// An appointment row. The name/phone/specialization/hospital fields are
/// snapshots taken at creation time; later edits to the patient or doctor
/// record do not propagate here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub patient_phone: String,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub doctor_specialization: String,
    pub hospital_name: Option<String>,
    pub appointment_type: String,
    pub date: NaiveDate,
    pub time: String,
    pub reason: String,
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_by: CreatedBy,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
