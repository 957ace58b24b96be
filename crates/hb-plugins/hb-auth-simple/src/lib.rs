//! # hb-auth-simple
//!
//! Argon2-based implementation of `AdminAuth` for the single configured
//! admin identity. Failed attempts sleep a fixed interval before answering,
//! so an unknown username takes as long as a wrong password and neither can
//! be told apart from the outside.

use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use async_trait::async_trait;
use std::time::Duration;

use hb_core::traits::AdminAuth;

/// The one admin identity, constructed from configuration at startup.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    /// PHC-format argon2 hash of the admin password.
    pub password_hash: String,
}

pub struct SimpleAdminAuth {
    credentials: AdminCredentials,
    failure_delay: Duration,
}

impl SimpleAdminAuth {
    pub fn new(credentials: AdminCredentials) -> Self {
        Self {
            credentials,
            failure_delay: Duration::from_secs(1),
        }
    }

    /// Overrides the anti-enumeration delay; tests use zero.
    pub fn with_failure_delay(mut self, delay: Duration) -> Self {
        self.failure_delay = delay;
        self
    }

    /// Verifies a provided password against the stored argon2 hash.
    fn password_matches(&self, password: &str) -> bool {
        let parsed_hash = match PasswordHash::new(&self.credentials.password_hash) {
            Ok(p) => p,
            Err(e) => {
                log::error!("configured admin password hash is unparseable: {e}");
                return false;
            }
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[async_trait]
impl AdminAuth for SimpleAdminAuth {
    async fn verify_login(&self, username: &str, password: &str) -> bool {
        let username_ok = username.trim() == self.credentials.username;
        if username_ok && self.password_matches(password) {
            return true;
        }
        tokio::time::sleep(self.failure_delay).await;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};

    fn auth_for(password: &str) -> SimpleAdminAuth {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string();
        SimpleAdminAuth::new(AdminCredentials {
            username: "admin".to_string(),
            password_hash: hash,
        })
        .with_failure_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_correct_credentials_pass() {
        let auth = auth_for("hunter2");
        assert!(auth.verify_login("admin", "hunter2").await);
        // Usernames are trimmed, like the login form sends them.
        assert!(auth.verify_login("  admin  ", "hunter2").await);
    }

    #[tokio::test]
    async fn test_wrong_password_fails() {
        let auth = auth_for("hunter2");
        assert!(!auth.verify_login("admin", "hunter3").await);
    }

    #[tokio::test]
    async fn test_unknown_username_fails() {
        let auth = auth_for("hunter2");
        assert!(!auth.verify_login("root", "hunter2").await);
    }

    #[tokio::test]
    async fn test_garbage_hash_never_verifies() {
        let auth = SimpleAdminAuth::new(AdminCredentials {
            username: "admin".to_string(),
            password_hash: "not-a-phc-hash".to_string(),
        })
        .with_failure_delay(Duration::ZERO);
        assert!(!auth.verify_login("admin", "anything").await);
    }
}
