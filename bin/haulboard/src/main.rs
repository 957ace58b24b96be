//! # Haulboard Binary
//!
//! The entry point that assembles the application: backend selection is a
//! runtime tag (DATABASE_URL present or not), everything behind the
//! `ContactStore`/`AdminAuth` ports.

mod config;

use actix_web::{web, App, HttpServer};
use std::sync::Arc;

use config::Config;
use hb_api::hub::NotificationHub;
use hb_api::upload::LocalUploadStore;
use hb_api::{configure_routes, middleware, AppState};
use hb_auth_simple::SimpleAdminAuth;
use hb_core::traits::{AdminAuth, ContactStore};
use hb_store_json::JsonContactStore;
use hb_store_sqlite::SqliteContactStore;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cfg = Config::from_env()?;

    // 1. Pick the storage implementation
    let store: Arc<dyn ContactStore> = match &cfg.database_url {
        Some(url) => {
            let store = SqliteContactStore::connect(url).await?;
            log::info!("using relational contact store");
            Arc::new(store)
        }
        None => {
            let path = cfg.data_dir.join("contacts.json");
            log::info!("using JSON contact store at {}", path.display());
            Arc::new(JsonContactStore::new(path))
        }
    };

    // 2. Auth, notification hub and upload storage
    let auth: Arc<dyn AdminAuth> = Arc::new(SimpleAdminAuth::new(cfg.admin.clone()));
    let hub = Arc::new(NotificationHub::new());
    let uploads = LocalUploadStore::new(cfg.data_dir.join("uploads"), "/data/uploads".to_string());

    // 3. Wrap in AppState (dynamic dispatch behind the ports)
    let state = web::Data::new(AppState {
        store,
        auth,
        hub,
        uploads,
        production: cfg.production,
    });

    let session_secret = cfg.session_secret.clone();
    let production = cfg.production;

    log::info!("haulboard listening on http://0.0.0.0:{}", cfg.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::standard_middleware())
            .wrap(middleware::session_middleware(
                session_secret.as_bytes(),
                production,
            ))
            .configure(configure_routes)
    })
    .bind(("0.0.0.0", cfg.port))?
    .run()
    .await?;

    Ok(())
}
