//! Appointment endpoints: booking from either side, listings, reads and
//! status changes gated on being a party to the record.

use axum::extract::Path;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::endpoints::required;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::appointment::{self, BookingDetails};
use crate::authorization::{self, Principal};
use crate::db::repository::{
    get_appointment, list_appointments_for_doctor, list_appointments_for_patient,
};
use crate::models::{Appointment, AppointmentStatus};

#[derive(Deserialize)]
pub struct CreateByPatientRequest {
    pub doctor_id: Option<Uuid>,
    pub appointment_type: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct AppointmentResponse {
    pub success: bool,
    pub appointment: Appointment,
}

/// `POST /api/appointments/patient/create`
pub async fn create_by_patient(
    Extension(ctx): Extension<ApiContext>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateByPatientRequest>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    if !authorization::is_patient(&principal) {
        return Err(ApiError::Forbidden("Patient account required".into()));
    }

    let doctor_id = required(req.doctor_id, "doctor_id")?;
    let details = BookingDetails {
        appointment_type: required(req.appointment_type, "appointment_type")?,
        date: required(req.date, "date")?,
        time: required(req.time, "time")?,
        reason: required(req.reason, "reason")?,
        notes: req.notes,
    };

    let conn = ctx.open_db()?;
    let appointment =
        appointment::create_by_patient(&conn, &principal.id, &doctor_id, details)?;

    Ok(Json(AppointmentResponse {
        success: true,
        appointment,
    }))
}

#[derive(Deserialize)]
pub struct CreateByDoctorRequest {
    pub patient_id: Option<Uuid>,
    pub appointment_type: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// `POST /api/appointments/doctor/create`
pub async fn create_by_doctor(
    Extension(ctx): Extension<ApiContext>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateByDoctorRequest>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    if !authorization::is_doctor(&principal) {
        return Err(ApiError::Forbidden("Doctor account required".into()));
    }

    let patient_id = required(req.patient_id, "patient_id")?;
    let details = BookingDetails {
        appointment_type: required(req.appointment_type, "appointment_type")?,
        date: required(req.date, "date")?,
        time: required(req.time, "time")?,
        reason: required(req.reason, "reason")?,
        notes: req.notes,
    };

    let conn = ctx.open_db()?;
    let appointment =
        appointment::create_by_doctor(&conn, &principal.id, &patient_id, details)?;

    Ok(Json(AppointmentResponse {
        success: true,
        appointment,
    }))
}

#[derive(Serialize)]
pub struct AppointmentListResponse {
    pub success: bool,
    pub appointments: Vec<Appointment>,
}

/// `GET /api/appointments/patient/list`
pub async fn list_for_patient(
    Extension(ctx): Extension<ApiContext>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<AppointmentListResponse>, ApiError> {
    if !authorization::is_patient(&principal) {
        return Err(ApiError::Forbidden("Patient account required".into()));
    }

    let conn = ctx.open_db()?;
    let appointments = list_appointments_for_patient(&conn, &principal.id)?;

    Ok(Json(AppointmentListResponse {
        success: true,
        appointments,
    }))
}

/// `GET /api/appointments/doctor/list`
pub async fn list_for_doctor(
    Extension(ctx): Extension<ApiContext>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<AppointmentListResponse>, ApiError> {
    if !authorization::is_doctor(&principal) {
        return Err(ApiError::Forbidden("Doctor account required".into()));
    }

    let conn = ctx.open_db()?;
    let appointments = list_appointments_for_doctor(&conn, &principal.id)?;

    Ok(Json(AppointmentListResponse {
        success: true,
        appointments,
    }))
}

fn load_for_party(
    conn: &rusqlite::Connection,
    principal: &Principal,
    id: &Uuid,
) -> Result<Appointment, ApiError> {
    let appointment = get_appointment(conn, id)?
        .ok_or_else(|| ApiError::NotFound("Appointment not found".into()))?;
    if !authorization::is_party(principal, &appointment) {
        return Err(ApiError::Forbidden(
            "Not a party to this appointment".into(),
        ));
    }
    Ok(appointment)
}

/// `GET /api/appointments/:id`
pub async fn get_by_id(
    Extension(ctx): Extension<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let appointment = load_for_party(&conn, &principal, &id)?;

    Ok(Json(AppointmentResponse {
        success: true,
        appointment,
    }))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    pub notes: Option<String>,
}

/// `PUT /api/appointments/:id/status` — forward-only transitions.
pub async fn update_status(
    Extension(ctx): Extension<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let status_str = required(req.status, "status")?;
    let new_status: AppointmentStatus = status_str
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid status: {status_str}")))?;

    let conn = ctx.open_db()?;
    let appointment = load_for_party(&conn, &principal, &id)?;
    let updated =
        appointment::transition(&conn, &appointment, new_status, req.notes.as_deref())?;

    Ok(Json(AppointmentResponse {
        success: true,
        appointment: updated,
    }))
}

/// `DELETE /api/appointments/:id` — cancels, never removes the row.
pub async fn cancel(
    Extension(ctx): Extension<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let appointment = load_for_party(&conn, &principal, &id)?;
    let cancelled = appointment::cancel(&conn, &appointment)?;

    Ok(Json(AppointmentResponse {
        success: true,
        appointment: cancelled,
    }))
}
