//! # hb-api
//!
//! The web routing and orchestration layer for Haulboard.

pub mod admin;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod middleware;
pub mod upload;

use actix_web::web;
use std::sync::Arc;

use hb_core::traits::{AdminAuth, ContactStore};
use hub::NotificationHub;
use upload::LocalUploadStore;

/// State shared across all actix-web workers.
pub struct AppState {
    pub store: Arc<dyn ContactStore>,
    pub auth: Arc<dyn AdminAuth>,
    pub hub: Arc<NotificationHub>,
    pub uploads: LocalUploadStore,
    /// Masks internal error detail in responses when set.
    pub production: bool,
}

/// Configures the routes for the contact-request API.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public intake endpoint
            .route("/contact", web::post().to(handlers::submit_contact))
            // Moderation surface, session-gated inside each handler
            .service(
                web::scope("/admin")
                    .route("/login", web::post().to(admin::login))
                    .route("/logout", web::post().to(admin::logout))
                    .route("/auth-check", web::get().to(admin::auth_check))
                    .route("/contacts", web::get().to(admin::list_contacts))
                    .route("/contacts/{id}", web::patch().to(admin::update_contact_status))
                    .route("/contacts/{id}", web::delete().to(admin::delete_contact))
                    .route("/stats", web::get().to(admin::stats))
                    .route("/stream", web::get().to(admin::stream)),
            ),
    )
    // Stored attachments are only visible to the authenticated admin.
    .route("/data/uploads/{filename}", web::get().to(admin::serve_upload));
}
