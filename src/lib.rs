//! MediPoint: appointment and consultation management for a small clinic.
//!
//! Patients and doctors register and log in; appointments move through a
//! forward-only lifecycle between them; doctors record consultations
//! against patients resolved through the MP- patient-ID codec.

pub mod api;
pub mod appointment;
pub mod authorization;
pub mod config;
pub mod consultation;
pub mod db;
pub mod models;
pub mod patient_id;
