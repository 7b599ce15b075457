//! Patient endpoints: registration, login, profile, consultation history.

use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::endpoints::{hash_password, required, verify_password};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::authorization::{self, Principal};
use crate::db::repository::{
    get_patient, get_patient_by_email, insert_patient, list_consultations_for_patient,
    update_patient_profile, ConsultationWithNames,
};
use crate::models::{NewPatient, Patient, PatientProfileUpdate, Role};
use crate::patient_id;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub blood_group: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub current_medications: Vec<String>,
    #[serde(default)]
    pub chronic_conditions: Vec<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub emergency_contact_relation: Option<String>,
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub citizenship_country: Option<String>,
    pub national_id: Option<String>,
    pub photo_path: Option<String>,
    pub id_document_path: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    /// Display identifier from the patient-ID codec, shown on the card the
    /// patient hands to a doctor.
    pub display_id: String,
    pub patient: Patient,
}

/// `POST /api/patients/register`
pub async fn register(
    Extension(ctx): Extension<ApiContext>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let full_name = required(req.full_name, "full_name")?;
    let email = required(req.email, "email")?;
    let password = required(req.password, "password")?;
    let phone = required(req.phone, "phone")?;
    let date_of_birth = required(req.date_of_birth, "date_of_birth")?;

    let new = NewPatient {
        full_name,
        email,
        password_hash: hash_password(&password)?,
        phone,
        gender: req.gender,
        date_of_birth,
        blood_group: req.blood_group,
        height: req.height,
        weight: req.weight,
        allergies: req.allergies,
        current_medications: req.current_medications,
        chronic_conditions: req.chronic_conditions,
        emergency_contact_name: req.emergency_contact_name,
        emergency_contact_phone: req.emergency_contact_phone,
        emergency_contact_relation: req.emergency_contact_relation,
        address_line: req.address_line,
        city: req.city,
        state: req.state,
        postal_code: req.postal_code,
        country: req.country,
        citizenship_country: req.citizenship_country,
        national_id: req.national_id,
        photo_path: req.photo_path,
        id_document_path: req.id_document_path,
    };

    let conn = ctx.open_db()?;
    let patient = insert_patient(&conn, &new).map_err(|e| {
        if e.is_unique_violation() {
            ApiError::Conflict("Email already registered".into())
        } else {
            e.into()
        }
    })?;

    let token = ctx.issue_token(Principal {
        id: patient.id,
        role: Role::Patient,
        phone: Some(patient.phone.clone()),
    })?;

    tracing::info!(patient_number = patient.patient_number, "patient registered");

    Ok(Json(AuthResponse {
        success: true,
        token,
        display_id: patient_id::encode(patient.patient_number, patient.date_of_birth),
        patient,
    }))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `POST /api/patients/login`
pub async fn login(
    Extension(ctx): Extension<ApiContext>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = required(req.email, "email")?;
    let password = required(req.password, "password")?;

    let conn = ctx.open_db()?;
    let patient = get_patient_by_email(&conn, &email)?.ok_or(ApiError::Unauthorized)?;

    if !verify_password(&password, &patient.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let token = ctx.issue_token(Principal {
        id: patient.id,
        role: Role::Patient,
        phone: Some(patient.phone.clone()),
    })?;

    Ok(Json(AuthResponse {
        success: true,
        token,
        display_id: patient_id::encode(patient.patient_number, patient.date_of_birth),
        patient,
    }))
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub patient: Patient,
}

/// `GET /api/patients/profile`
pub async fn get_profile(
    Extension(ctx): Extension<ApiContext>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ProfileResponse>, ApiError> {
    if !authorization::is_patient(&principal) {
        return Err(ApiError::Forbidden("Patient account required".into()));
    }

    let conn = ctx.open_db()?;
    let patient = get_patient(&conn, &principal.id)?
        .ok_or_else(|| ApiError::NotFound("Patient not found".into()))?;

    Ok(Json(ProfileResponse {
        success: true,
        patient,
    }))
}

/// `PUT /api/patients/profile` — whitelisted fields only.
pub async fn update_profile(
    Extension(ctx): Extension<ApiContext>,
    Extension(principal): Extension<Principal>,
    Json(update): Json<PatientProfileUpdate>,
) -> Result<Json<ProfileResponse>, ApiError> {
    if !authorization::is_patient(&principal) {
        return Err(ApiError::Forbidden("Patient account required".into()));
    }

    let conn = ctx.open_db()?;
    update_patient_profile(&conn, &principal.id, &update)?;
    let patient = get_patient(&conn, &principal.id)?
        .ok_or_else(|| ApiError::NotFound("Patient not found".into()))?;

    Ok(Json(ProfileResponse {
        success: true,
        patient,
    }))
}

#[derive(Serialize)]
pub struct ConsultationsResponse {
    pub success: bool,
    pub consultations: Vec<ConsultationWithNames>,
}

/// `GET /api/patients/consultations` — joined against current doctor names.
pub async fn consultations(
    Extension(ctx): Extension<ApiContext>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ConsultationsResponse>, ApiError> {
    if !authorization::is_patient(&principal) {
        return Err(ApiError::Forbidden("Patient account required".into()));
    }

    let conn = ctx.open_db()?;
    let consultations = list_consultations_for_patient(&conn, &principal.id)?;

    Ok(Json(ConsultationsResponse {
        success: true,
        consultations,
    }))
}
