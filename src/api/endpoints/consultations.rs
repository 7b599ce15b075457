//! Consultation endpoints (doctor side). Creation resolves the patient
//! through the patient-ID codec; listings join current names at read time.

use axum::extract::Query;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::endpoints::required;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::authorization::{self, Principal};
use crate::consultation::{self, ConsultationDetails};
use crate::db::repository::{list_consultations_for_doctor, ConsultationWithNames};
use crate::models::Consultation;

#[derive(Deserialize)]
pub struct CreateRequest {
    /// Display identifier or raw key, as typed by the doctor.
    pub patient_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub prescriptions: Option<Vec<String>>,
    pub hospital: Option<String>,
    pub follow_up_required: Option<bool>,
}

#[derive(Serialize)]
pub struct CreateResponse {
    pub success: bool,
    pub consultation: Consultation,
    /// The resolved patient's current full name, read fresh at creation.
    pub patient_name: String,
}

/// `POST /api/doctors/consultations`
pub async fn create(
    Extension(ctx): Extension<ApiContext>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateRequest>,
) -> Result<Json<CreateResponse>, ApiError> {
    if !authorization::is_doctor(&principal) {
        return Err(ApiError::Forbidden("Doctor account required".into()));
    }

    let patient_id_input = required(req.patient_id, "patient_id")?;
    let details = ConsultationDetails {
        date: required(req.date, "date")?,
        diagnosis: req.diagnosis,
        notes: req.notes,
        prescriptions: req.prescriptions,
        hospital: req.hospital,
        follow_up_required: req.follow_up_required,
    };

    let conn = ctx.open_db()?;
    let created = consultation::create(&conn, &principal.id, &patient_id_input, details)?;

    Ok(Json(CreateResponse {
        success: true,
        consultation: created.consultation,
        patient_name: created.patient_name,
    }))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub patient_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub consultations: Vec<ConsultationWithNames>,
}

/// `GET /api/doctors/consultations?patient_id=...`
pub async fn list_for_doctor(
    Extension(ctx): Extension<ApiContext>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    if !authorization::is_doctor(&principal) {
        return Err(ApiError::Forbidden("Doctor account required".into()));
    }

    let conn = ctx.open_db()?;
    let consultations =
        list_consultations_for_doctor(&conn, &principal.id, query.patient_id.as_ref())?;

    Ok(Json(ListResponse {
        success: true,
        consultations,
    }))
}
