//! HTTP mapping for domain errors. Admin endpoints answer failures with a
//! JSON `{"error": ...}` envelope; internal causes are logged and, in
//! production, replaced with a generic message.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

use hb_core::error::AppError;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Maps a domain error to its HTTP shape. `production` decides whether
    /// internal detail is echoed back or replaced.
    pub fn from_app(err: AppError, production: bool) -> Self {
        match err {
            AppError::NotFound(..) => Self::new(StatusCode::NOT_FOUND, "Contact not found"),
            AppError::Validation(e) => Self::bad_request(e.to_string()),
            AppError::InvalidRequest(message) => Self::bad_request(message),
            AppError::Unauthorized(_) => Self::unauthorized(),
            AppError::Internal(detail) => {
                log::error!("internal error: {detail}");
                if production {
                    Self::internal("Internal server error")
                } else {
                    Self::internal(detail)
                }
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(json!({ "error": self.message }))
    }
}
