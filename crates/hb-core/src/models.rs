//! # Domain Models
//!
//! These structs represent the core entities of Haulboard. A single entity,
//! the `ContactRequest`, flows through intake, moderation and both storage
//! backends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Moderation state of a contact request.
///
/// Any of the three values may be set from any prior state; there is no
/// enforced ordering beyond membership in this set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    #[default]
    New,
    Contacted,
    Completed,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::New => "new",
            ContactStatus::Contacted => "contacted",
            ContactStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a wire value is not one of the three known statuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid status value")]
pub struct InvalidStatus;

impl FromStr for ContactStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ContactStatus::New),
            "contacted" => Ok(ContactStatus::Contacted),
            "completed" => Ok(ContactStatus::Completed),
            _ => Err(InvalidStatus),
        }
    }
}

/// Metadata for one uploaded image attached to a contact request.
///
/// Field names mirror the persisted document layout, so records written by
/// either backend deserialize unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Stored filename on disk (already re-derived to a safe base name).
    pub filename: String,
    /// Client-supplied name, sanitized before storage.
    #[serde(rename = "originalName")]
    pub original_name: String,
    /// Public URL path the admin dashboard fetches the image from.
    pub path: String,
    pub size: u64,
    pub mimetype: String,
}

fn default_preferred_time() -> String {
    "Any time".to_string()
}

/// One customer service inquiry.
///
/// `id` is opaque to callers: the JSON backend assigns epoch-millis strings,
/// the relational backend a surrogate integer rendered as its decimal string.
/// The two must never be assumed comparable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRequest {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub zip: String,
    #[serde(rename = "preferredDate")]
    pub preferred_date: String,
    #[serde(rename = "preferredTime", default = "default_preferred_time")]
    pub preferred_time: String,
    pub items: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub images: Vec<AttachmentRef>,
    #[serde(default)]
    pub status: ContactStatus,
    // Older documents predate these columns; fall back to "now" on read.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Validated, sanitized submission ready for `ContactStore::create`.
///
/// Produced only by the validation layer; the store assigns id, timestamps
/// and the initial `new` status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub zip: String,
    pub preferred_date: String,
    pub preferred_time: String,
    pub items: String,
    pub location: Option<String>,
    pub images: Vec<AttachmentRef>,
}

/// Per-status record counts, computed fresh on every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactStats {
    pub total: u64,
    pub new: u64,
    pub contacted: u64,
    pub completed: u64,
}
