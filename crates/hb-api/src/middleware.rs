//! haulboard/crates/hb-api/src/middleware.rs
//!
//! Shared middleware construction for the Haulboard API.

use actix_session::config::PersistentSession;
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::{time::Duration, Key, SameSite};
use actix_web::middleware::Logger;

// Returns a standard set of middleware for the Haulboard API.
pub fn standard_middleware() -> Logger {
    // We use the 'default' logger which outputs:
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

/// Cookie-backed admin session. HttpOnly, SameSite=Strict, Secure in
/// production, 24h lifetime. The secret must be at least 32 bytes; the
/// config layer enforces that before we get here.
pub fn session_middleware(secret: &[u8], production: bool) -> SessionMiddleware<CookieSessionStore> {
    let key = Key::derive_from(secret);
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("sessionId".to_string())
        .cookie_secure(production)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Strict)
        .session_lifecycle(PersistentSession::default().session_ttl(Duration::hours(24)))
        .build()
}
