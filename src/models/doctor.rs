use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::VerificationStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub license_number: String,
    pub specializations: Vec<String>,
    pub years_of_experience: Option<i64>,
    pub hospital: Option<String>,
    pub qualifications: Option<String>,
    pub available_days: Vec<String>,
    pub consultation_fee: Option<f64>,
    pub payment_methods: Vec<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub citizenship_country: Option<String>,
    pub national_id: Option<String>,
    pub license_document_path: Option<String>,
    pub degree_document_path: Option<String>,
    pub id_document_path: Option<String>,
    pub photo_path: Option<String>,
    /// Always equals `verification_status == Approved`.
    pub is_verified: bool,
    pub verification_status: VerificationStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Doctor {
    /// Comma-joined specialization list, the form snapshotted onto
    /// appointments at creation time.
    pub fn specialization_display(&self) -> String {
        self.specializations.join(", ")
    }
}

/// Registration input. Verification starts at pending; the four document
/// references are required at the endpoint layer.
#[derive(Debug, Clone)]
pub struct NewDoctor {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub license_number: String,
    pub specializations: Vec<String>,
    pub years_of_experience: Option<i64>,
    pub hospital: Option<String>,
    pub qualifications: Option<String>,
    pub available_days: Vec<String>,
    pub consultation_fee: Option<f64>,
    pub payment_methods: Vec<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub citizenship_country: Option<String>,
    pub national_id: Option<String>,
    pub license_document_path: Option<String>,
    pub degree_document_path: Option<String>,
    pub id_document_path: Option<String>,
    pub photo_path: Option<String>,
}

/// Whitelisted fields for doctor profile updates. Verification fields are
/// excluded on purpose; they change only through the verification update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub specializations: Option<Vec<String>>,
    pub years_of_experience: Option<i64>,
    pub hospital: Option<String>,
    pub qualifications: Option<String>,
    pub available_days: Option<Vec<String>>,
    pub consultation_fee: Option<f64>,
    pub payment_methods: Option<Vec<String>>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}
