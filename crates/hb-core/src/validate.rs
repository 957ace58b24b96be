//! # Validation Layer
//!
//! Pure functions that sanitize and check each submitted field. Checks fail
//! fast: the first failing rule wins, in a fixed order (required presence,
//! name, phone, email, zip, date, items).

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use validator::ValidateEmail;

use crate::models::NewContact;

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10,15}$").expect("phone regex"));
static ZIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{5}$").expect("zip regex"));
static ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("id regex"));

/// Why a submission was rejected. Messages are client-facing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing required fields")]
    MissingFields,
    #[error("Invalid name format")]
    InvalidName,
    #[error("Invalid phone number format")]
    InvalidPhone,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Invalid ZIP code format")]
    InvalidZip,
    #[error("Invalid date format")]
    InvalidDate,
    #[error("Items description must be between 5 and 1000 characters")]
    InvalidItems,
}

/// Raw form fields as received from the contact form, before any checks.
/// The wire names `when`/`time` map to preferred date and time.
#[derive(Debug, Clone, Default)]
pub struct RawSubmission {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub zip: Option<String>,
    pub when: Option<String>,
    pub time: Option<String>,
    pub items: Option<String>,
    pub location: Option<String>,
}

/// Trim + HTML-entity escape. Decoding first keeps the transform idempotent:
/// re-sanitizing an already stored value never double-escapes its entities.
pub fn sanitize(input: &str) -> String {
    let decoded = html_escape::decode_html_entities(input.trim());
    html_escape::encode_safe(decoded.as_ref()).to_string()
}

/// Strips the formatting characters people type into phone fields.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')' | '.'))
        .collect()
}

pub fn is_valid_phone(normalized: &str) -> bool {
    PHONE_RE.is_match(normalized)
}

pub fn is_valid_zip(zip: &str) -> bool {
    ZIP_RE.is_match(zip)
}

/// Store ids are decimal strings in both backends; moderation endpoints
/// shape-check before touching storage.
pub fn is_valid_id(id: &str) -> bool {
    ID_RE.is_match(id)
}

/// Accepts a plain ISO-8601 calendar date or a full RFC 3339 timestamp.
pub fn is_valid_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok()
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Checks and sanitizes a raw submission. On success the returned
/// `NewContact` carries every field escaped and normalized, with an empty
/// attachment list for the caller to fill in.
pub fn validate_submission(raw: &RawSubmission) -> Result<NewContact, ValidationError> {
    if !present(&raw.name)
        || !present(&raw.phone)
        || !present(&raw.zip)
        || !present(&raw.when)
        || !present(&raw.items)
    {
        return Err(ValidationError::MissingFields);
    }

    let name = sanitize(raw.name.as_deref().unwrap_or_default());
    let len = name.chars().count();
    if len < 2 || len > 100 {
        return Err(ValidationError::InvalidName);
    }

    let phone = normalize_phone(&sanitize(raw.phone.as_deref().unwrap_or_default()));
    if !is_valid_phone(&phone) {
        return Err(ValidationError::InvalidPhone);
    }

    let email = raw
        .email
        .as_deref()
        .map(sanitize)
        .filter(|v| !v.is_empty());
    if let Some(email) = &email {
        if !email.validate_email() {
            return Err(ValidationError::InvalidEmail);
        }
    }

    let zip = sanitize(raw.zip.as_deref().unwrap_or_default());
    if !is_valid_zip(&zip) {
        return Err(ValidationError::InvalidZip);
    }

    let preferred_date = sanitize(raw.when.as_deref().unwrap_or_default());
    if !is_valid_date(&preferred_date) {
        return Err(ValidationError::InvalidDate);
    }

    let items = sanitize(raw.items.as_deref().unwrap_or_default());
    let len = items.chars().count();
    if len < 5 || len > 1000 {
        return Err(ValidationError::InvalidItems);
    }

    let preferred_time = raw
        .time
        .as_deref()
        .map(sanitize)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "Any time".to_string());
    let location = raw
        .location
        .as_deref()
        .map(sanitize)
        .filter(|v| !v.is_empty());

    Ok(NewContact {
        name,
        phone,
        email,
        zip,
        preferred_date,
        preferred_time,
        items,
        location,
        images: Vec::new(),
    })
}
