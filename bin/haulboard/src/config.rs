//! Environment-driven configuration, assembled once at startup and passed
//! down explicitly. Admin credentials live in a struct, not in globals.

use anyhow::Context;
use std::env;
use std::path::PathBuf;

use hb_auth_simple::AdminCredentials;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    /// When set, the relational backend is used; otherwise the flat JSON
    /// document under `data_dir`.
    pub database_url: Option<String>,
    pub session_secret: String,
    pub admin: AdminCredentials,
    pub production: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match env::var("PORT") {
            Ok(value) => value.parse().context("PORT must be a number")?,
            Err(_) => 8080,
        };

        let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()));
        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let session_secret =
            env::var("SESSION_SECRET").context("SESSION_SECRET is required")?;
        anyhow::ensure!(
            session_secret.len() >= 32,
            "SESSION_SECRET must be at least 32 bytes"
        );

        let admin = AdminCredentials {
            username: env::var("ADMIN_USERNAME").context("ADMIN_USERNAME is required")?,
            password_hash: env::var("ADMIN_PASSWORD_HASH")
                .context("ADMIN_PASSWORD_HASH is required")?,
        };

        let production = env::var("APP_ENV").map(|v| v == "production").unwrap_or(false);

        Ok(Self {
            port,
            data_dir,
            database_url,
            session_secret,
            admin,
            production,
        })
    }
}
