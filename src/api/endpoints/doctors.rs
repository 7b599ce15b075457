//! Doctor endpoints: registration, login, profile, patient search.

use axum::extract::Path;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::endpoints::{hash_password, required, verify_password};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::authorization::{self, Principal};
use crate::db::repository::{
    get_doctor, get_doctor_by_email, insert_doctor, update_doctor_profile,
};
use crate::models::{Doctor, DoctorProfileUpdate, NewDoctor, Role};
use crate::patient_id;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub license_number: Option<String>,
    #[serde(default)]
    pub specializations: Vec<String>,
    pub years_of_experience: Option<i64>,
    pub hospital: Option<String>,
    pub qualifications: Option<String>,
    #[serde(default)]
    pub available_days: Vec<String>,
    pub consultation_fee: Option<f64>,
    #[serde(default)]
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

#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub doctor: Doctor,
}

/// `POST /api/doctors/register` — verification starts at pending; the
/// account is usable (bookable) before review completes.
pub async fn register(
    Extension(ctx): Extension<ApiContext>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let full_name = required(req.full_name, "full_name")?;
    let email = required(req.email, "email")?;
    let password = required(req.password, "password")?;
    let phone = required(req.phone, "phone")?;
    let license_number = required(req.license_number, "license_number")?;
    // All four uploaded documents must be referenced before the account
    // exists; verification review has nothing to look at otherwise.
    let license_document_path = required(req.license_document_path, "license_document_path")?;
    let degree_document_path = required(req.degree_document_path, "degree_document_path")?;
    let id_document_path = required(req.id_document_path, "id_document_path")?;
    let photo_path = required(req.photo_path, "photo_path")?;

    let new = NewDoctor {
        full_name,
        email,
        password_hash: hash_password(&password)?,
        phone,
        gender: req.gender,
        date_of_birth: req.date_of_birth,
        license_number,
        specializations: req.specializations,
        years_of_experience: req.years_of_experience,
        hospital: req.hospital,
        qualifications: req.qualifications,
        available_days: req.available_days,
        consultation_fee: req.consultation_fee,
        payment_methods: req.payment_methods,
        address_line: req.address_line,
        city: req.city,
        state: req.state,
        postal_code: req.postal_code,
        country: req.country,
        citizenship_country: req.citizenship_country,
        national_id: req.national_id,
        license_document_path: Some(license_document_path),
        degree_document_path: Some(degree_document_path),
        id_document_path: Some(id_document_path),
        photo_path: Some(photo_path),
    };

    let conn = ctx.open_db()?;
    let doctor = insert_doctor(&conn, &new).map_err(|e| {
        if e.is_unique_violation() {
            ApiError::Conflict("Email or license number already registered".into())
        } else {
            e.into()
        }
    })?;

    let token = ctx.issue_token(Principal {
        id: doctor.id,
        role: Role::Doctor,
        phone: Some(doctor.phone.clone()),
    })?;

    tracing::info!(doctor_id = %doctor.id, "doctor registered");

    Ok(Json(AuthResponse {
        success: true,
        token,
        doctor,
    }))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `POST /api/doctors/login`
pub async fn login(
    Extension(ctx): Extension<ApiContext>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = required(req.email, "email")?;
    let password = required(req.password, "password")?;

    let conn = ctx.open_db()?;
    let doctor = get_doctor_by_email(&conn, &email)?.ok_or(ApiError::Unauthorized)?;

    if !verify_password(&password, &doctor.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let token = ctx.issue_token(Principal {
        id: doctor.id,
        role: Role::Doctor,
        phone: Some(doctor.phone.clone()),
    })?;

    Ok(Json(AuthResponse {
        success: true,
        token,
        doctor,
    }))
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub doctor: Doctor,
}

/// `GET /api/doctors/profile`
pub async fn get_profile(
    Extension(ctx): Extension<ApiContext>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ProfileResponse>, ApiError> {
    if !authorization::is_doctor(&principal) {
        return Err(ApiError::Forbidden("Doctor account required".into()));
    }

    let conn = ctx.open_db()?;
    let doctor = get_doctor(&conn, &principal.id)?
        .ok_or_else(|| ApiError::NotFound("Doctor not found".into()))?;

    Ok(Json(ProfileResponse {
        success: true,
        doctor,
    }))
}

/// `PUT /api/doctors/profile` — whitelisted fields; verification fields
/// are not reachable from here.
pub async fn update_profile(
    Extension(ctx): Extension<ApiContext>,
    Extension(principal): Extension<Principal>,
    Json(update): Json<DoctorProfileUpdate>,
) -> Result<Json<ProfileResponse>, ApiError> {
    if !authorization::is_doctor(&principal) {
        return Err(ApiError::Forbidden("Doctor account required".into()));
    }

    let conn = ctx.open_db()?;
    update_doctor_profile(&conn, &principal.id, &update)?;
    let doctor = get_doctor(&conn, &principal.id)?
        .ok_or_else(|| ApiError::NotFound("Doctor not found".into()))?;

    Ok(Json(ProfileResponse {
        success: true,
        doctor,
    }))
}

#[derive(Serialize)]
pub struct SearchPatientResponse {
    pub success: bool,
    pub patient: crate::models::Patient,
    pub display_id: String,
}

/// `GET /api/doctors/search-patient/:patient_id` — resolve a typed patient
/// identifier (display form or raw key) to the full record. Doctor role
/// required; no patient-identity gate, this is the card-lookup flow.
pub async fn search_patient(
    Extension(ctx): Extension<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(patient_id_input): Path<String>,
) -> Result<Json<SearchPatientResponse>, ApiError> {
    if !authorization::is_doctor(&principal) {
        return Err(ApiError::Forbidden("Doctor account required".into()));
    }

    let conn = ctx.open_db()?;
    let patient = patient_id::resolve(&conn, &patient_id_input)?;

    Ok(Json(SearchPatientResponse {
        success: true,
        display_id: patient_id::encode(patient.patient_number, patient.date_of_birth),
        patient,
    }))
}
