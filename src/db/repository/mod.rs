//! Repository layer — entity-scoped database operations.
//!
//! One sub-module per entity. All public functions are re-exported here.

mod appointment;
mod consultation;
mod doctor;
mod patient;

pub use appointment::*;
pub use consultation::*;
pub use doctor::*;
pub use patient::*;

/// Serialize a string list for a JSON text column.
pub(crate) fn to_json_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Parse a JSON text column back into a string list. Malformed data
/// degrades to an empty list rather than failing the row read.
pub(crate) fn from_json_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}
