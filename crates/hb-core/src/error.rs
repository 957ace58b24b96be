//! # AppError
//!
//! Centralized error handling for the Haulboard ecosystem.
//! Maps domain-specific failures to actionable error types.

use crate::validate::ValidationError;
use thiserror::Error;

/// The primary error type for all hb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., a contact id absent from the store)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Submission failed a validation rule
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Malformed moderation request (bad id shape, unknown status value)
    #[error("{0}")]
    InvalidRequest(String),

    /// Security/Auth failure (missing or stale admin session)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (DB down, document unreadable). The message is
    /// for logs only and must never be echoed to a client verbatim in
    /// production.
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for the one entity this system stores.
    pub fn contact_not_found(id: &str) -> Self {
        AppError::NotFound("Contact".to_string(), id.to_string())
    }
}

/// A specialized Result type for Haulboard logic.
pub type Result<T> = std::result::Result<T, AppError>;
