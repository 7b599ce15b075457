use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A consultation row. Unlike appointments, no names are stored here;
/// listings join the patient and doctor records at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub prescriptions: Vec<String>,
    pub hospital: Option<String>,
    pub follow_up_required: bool,
    pub created_at: NaiveDateTime,
}
