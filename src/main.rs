use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod service;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::service::reports::BranchReports;
use crate::service::tracker::AttendanceTracker;
use crate::store::{ActionLog, AttendanceLedger, IdentityStore, UserStore, mysql::MySqlStore};
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance tracker up"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "attendance.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(clock = ?config.attendance_clock, "Server starting...");

    let pool = init_db(&config).await?;
    let store = Arc::new(MySqlStore::new(pool));

    let identity: Arc<dyn IdentityStore> = store.clone();
    let ledger: Arc<dyn AttendanceLedger> = store.clone();
    let actions: Arc<dyn ActionLog> = store.clone();
    let users: Arc<dyn UserStore> = store;

    // Shared across workers so the per-employee locks and the employee cache are process-wide
    let tracker = Data::new(AttendanceTracker::new(
        identity.clone(),
        ledger.clone(),
        config.attendance_clock,
        config.employee_cache_ttl,
    ));
    let reports = Data::new(BranchReports::new(identity, ledger, actions.clone()));
    let users = Data::from(users);
    let actions = Data::from(actions);

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(tracker.clone())
            .app_data(reports.clone())
            .app_data(users.clone())
            .app_data(actions.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
