//! Patient-ID codec.
//!
//! Derives the shareable `MP-<seq><YYYYMMDD>` display identifier from a
//! patient's registration number and date of birth, and resolves such a
//! string (or a raw primary key) back to the patient row. The number+DOB
//! double key is the de facto authorization check: a caller must know both,
//! not just a guessable sequence number.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{get_patient, get_patient_by_number_and_dob};
use crate::db::DatabaseError;
use crate::models::Patient;

/// Derive the display identifier. The sequence number is zero-padded to two
/// digits; the date of birth is appended as `YYYYMMDD`.
pub fn encode(patient_number: i64, date_of_birth: NaiveDate) -> String {
    format!(
        "MP-{:02}{}",
        patient_number,
        date_of_birth.format("%Y%m%d")
    )
}

/// A parsed patient-ID string, before any store lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatientIdQuery {
    /// `MP-<digits><YYYYMMDD>`: sequence number plus date of birth, both of
    /// which must match the stored row.
    NumberAndDob {
        patient_number: i64,
        date_of_birth: NaiveDate,
    },
    /// A raw primary key, either embedded in an `MP-` string with a trailing
    /// date (ignored past parsing) or given bare.
    Key(Uuid),
}

fn number_dob_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^MP-?(\d{9,})$").expect("static regex"))
}

fn key_with_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:MP-?)?([0-9a-fA-F]{32})\d{8}$").expect("static regex"))
}

/// Parse a patient-ID string into a lookup query. Whitespace is stripped
/// first; the three input shapes are tried in order. Returns `None` when no
/// shape matches.
pub fn parse(input: &str) -> Option<PatientIdQuery> {
    let trimmed: String = input.split_whitespace().collect();

    // Shape 1: MP- followed by digits only. The trailing 8 digits are the
    // date; whatever precedes them is the sequence number, so numbers with
    // three or more digits still split correctly (len - 8 rule). Encoding
    // always pads to two digits, so at least 9 digits are present.
    if let Some(caps) = number_dob_re().captures(&trimmed) {
        let digits = &caps[1];
        let split = digits.len() - 8;
        let patient_number: i64 = digits[..split].parse().ok()?;
        let date_of_birth = NaiveDate::parse_from_str(&digits[split..], "%Y%m%d").ok()?;
        return Some(PatientIdQuery::NumberAndDob {
            patient_number,
            date_of_birth,
        });
    }

    // Shape 2: a raw key with a trailing date. The date digits are parsed
    // off but otherwise ignored.
    if let Some(caps) = key_with_date_re().captures(&trimmed) {
        if let Ok(id) = Uuid::parse_str(&caps[1]) {
            return Some(PatientIdQuery::Key(id));
        }
    }

    // Shape 3: a bare primary key, hyphenated or plain hex.
    if let Ok(id) = Uuid::parse_str(&trimmed) {
        return Some(PatientIdQuery::Key(id));
    }

    None
}

/// Resolve a patient-ID string against the store. Any unmatched shape or
/// empty lookup is a not-found condition.
pub fn resolve(conn: &Connection, input: &str) -> Result<Patient, DatabaseError> {
    let not_found = || DatabaseError::NotFound {
        entity_type: "Patient".into(),
        id: input.trim().to_string(),
    };

    match parse(input) {
        Some(PatientIdQuery::NumberAndDob {
            patient_number,
            date_of_birth,
        }) => get_patient_by_number_and_dob(conn, patient_number, date_of_birth)?
            .ok_or_else(not_found),
        Some(PatientIdQuery::Key(id)) => get_patient(conn, &id)?.ok_or_else(not_found),
        None => Err(not_found()),
    }
}
