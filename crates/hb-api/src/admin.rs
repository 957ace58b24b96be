//! # Admin Moderation
//!
//! Session-gated handlers for reviewing, triaging and deleting contact
//! requests, plus the login/logout/auth-check session surface and the SSE
//! live-update stream. Every moderation handler checks the session before
//! touching storage.

use actix_files::NamedFile;
use actix_session::Session;
use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use hb_core::models::ContactStatus;
use hb_core::traits::{AdminAuth, ContactStore};
use hb_core::validate::is_valid_id;

use crate::error::ApiError;
use crate::hub::EventStream;
use crate::AppState;

const AUTH_KEY: &str = "isAuthenticated";
const USERNAME_KEY: &str = "username";

fn is_authenticated(session: &Session) -> bool {
    session.get::<bool>(AUTH_KEY).ok().flatten().unwrap_or(false)
}

/// The session gate. Fails before any storage call.
fn require_auth(session: &Session) -> Result<(), ApiError> {
    if is_authenticated(session) {
        Ok(())
    } else {
        Err(ApiError::unauthorized())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub async fn login(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let username = body.username.as_deref().map(str::trim).unwrap_or_default();
    let password = body.password.as_deref().unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Username and password required"));
    }

    if !state.auth.verify_login(username, password).await {
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid credentials"));
    }

    // Fresh session id before the privileged flag goes in (anti-fixation).
    session.renew();
    session
        .insert(AUTH_KEY, true)
        .map_err(|_| ApiError::internal("Session error"))?;
    session
        .insert(USERNAME_KEY, username)
        .map_err(|_| ApiError::internal("Session error"))?;

    log::info!("admin '{username}' logged in");
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Login successful" })))
}

pub async fn logout(session: Session) -> HttpResponse {
    session.purge();
    HttpResponse::Ok().json(json!({ "success": true, "message": "Logged out successfully" }))
}

pub async fn auth_check(session: Session) -> HttpResponse {
    let authenticated = is_authenticated(&session);
    let username = if authenticated {
        session.get::<String>(USERNAME_KEY).ok().flatten()
    } else {
        None
    };
    HttpResponse::Ok().json(json!({
        "isAuthenticated": authenticated,
        "username": username,
    }))
}

pub async fn list_contacts(
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, ApiError> {
    require_auth(&session)?;
    let contacts = state
        .store
        .list_all()
        .await
        .map_err(|e| ApiError::from_app(e, state.production))?;
    Ok(HttpResponse::Ok().json(contacts))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

pub async fn update_contact_status(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
    body: web::Json<StatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    require_auth(&session)?;

    let id = path.into_inner();
    if !is_valid_id(&id) {
        return Err(ApiError::bad_request("Invalid ID format"));
    }
    let status: ContactStatus = body
        .status
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid status value"))?;

    let contact = state
        .store
        .update_status(&id, status)
        .await
        .map_err(|e| ApiError::from_app(e, state.production))?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "contact": contact })))
}

pub async fn delete_contact(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    require_auth(&session)?;

    let id = path.into_inner();
    if !is_valid_id(&id) {
        return Err(ApiError::bad_request("Invalid ID format"));
    }

    let removed = state
        .store
        .delete(&id)
        .await
        .map_err(|e| ApiError::from_app(e, state.production))?;
    log::info!("contact {} deleted", removed.id);
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Contact deleted" })))
}

pub async fn stats(
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, ApiError> {
    require_auth(&session)?;
    let stats = state
        .store
        .stats()
        .await
        .map_err(|e| ApiError::from_app(e, state.production))?;
    Ok(HttpResponse::Ok().json(stats))
}

/// SSE endpoint for the admin dashboard. The stream stays open until the
/// client disconnects, which drops it and removes it from the hub.
pub async fn stream(
    state: web::Data<AppState>,
    session: Session,
) -> Result<HttpResponse, ApiError> {
    require_auth(&session)?;
    let events = EventStream::subscribe(state.hub.clone());
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(events))
}

/// Stored attachments are admin-only; the filename must be a bare name.
pub async fn serve_upload(
    state: web::Data<AppState>,
    session: Session,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    require_auth(&session)?;

    let filename = path.into_inner();
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(ApiError::bad_request("Invalid filename"));
    }

    let file = NamedFile::open_async(state.uploads.root().join(&filename))
        .await
        .map_err(|_| ApiError::new(StatusCode::NOT_FOUND, "File not found"))?;
    Ok(file.into_response(&req))
}
