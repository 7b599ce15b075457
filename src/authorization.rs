//! Shared authorization predicates.
//!
//! Two gates, used everywhere instead of per-handler re-implementations:
//! - `is_party`: identity-based — the principal must be the patient or the
//!   doctor referenced by an existing record. Used by appointment
//!   read/update/cancel.
//! - `is_doctor`: role-based — used by consultation creation and patient
//!   search, where no record exists yet to check identity against.
//!
//! The identity/role asymmetry is intentional; do not unify.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Appointment, Role};

/// The authenticated actor, decoded from a verified bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub phone: Option<String>,
}

/// Is the principal one of the two parties on this appointment?
pub fn is_party(principal: &Principal, appointment: &Appointment) -> bool {
    principal.id == appointment.patient_id || principal.id == appointment.doctor_id
}

pub fn is_doctor(principal: &Principal) -> bool {
    principal.role == Role::Doctor
}

pub fn is_patient(principal: &Principal) -> bool {
    principal.role == Role::Patient
}
