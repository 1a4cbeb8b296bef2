//! # linetrack: job tracking for manufacturing lines
//!
//! `linetrack` records which controller family and which stations are assigned to each
//! production line over time, which operator ran which job on which line and shift, and how
//! long each job took compared with the production time of the family the line was building.
//!
//! ## Overview
//!
//! A line builds one controller family at a time. The assignment of a family (or a station)
//! to a line is a time interval: it opens at `start_date` and stays active until it is
//! released, at which point `end_date` is set. Family intervals on one line never overlap and
//! an assignment that has started is never deleted, so every completed job can be measured
//! against the single family that was on its line at the job's `job_date`.
//!
//! The two kinds of assignment differ in how a conflict is handled:
//!
//! - a controller family with an active assignment must be released before it is assigned
//!   again, and a line that already has a family for an overlapping period rejects another
//! - a station that is moved to another line has its running assignment closed at the new
//!   start in the same transaction. A move may be backdated but not to before the running
//!   assignment began.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum) and all state lives in
//! PostgreSQL, accessed through [sqlx](https://github.com/launchbadge/sqlx).
//!
//! - [`api`]: request handlers and the JSON request/response models. Every response uses the
//!   `{success, data, message}` envelope.
//! - [`auth`]: password hashing, session tokens and the [`auth::current_user::CurrentUser`]
//!   extractor.
//! - [`db`]: repositories over a borrowed connection. The assignment repository is generic
//!   over the assignment kind, so families and stations share one implementation of the
//!   interval rules.
//! - [`efficiency`]: the duration arithmetic behind `/userEfficiency/getefficiency`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use linetrack::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = linetrack::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     linetrack::telemetry::init_telemetry(config.enable_otel_export, config.log_format)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! Migrations in `migrations/` run on startup.

pub mod api;
pub mod auth;
pub mod config;
pub mod datetime;
pub mod db;
pub mod efficiency;
pub mod errors;
mod openapi;
pub mod telemetry;
#[cfg(test)]
pub mod test_utils;
pub mod types;

use crate::{
    api::models::users::Role,
    auth::password,
    config::CorsOrigin,
    db::{
        handlers::{Repository, Users},
        models::users::UserCreateDBRequest,
    },
    openapi::ApiDoc,
    types::UserId,
};
use anyhow::Context;
use axum::{
    Router,
    http::{self, HeaderValue},
    routing::{delete, get, post, put},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info, instrument, warn, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Shared state handed to every request handler.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the linetrack database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the configured ADMIN user, or reset its password if it already exists.
///
/// Does nothing without `admin_password`, since an admin that cannot log in is of no use.
/// Returns the admin's ID when one exists after the call.
#[instrument(skip_all, fields(employee_id = %config.admin_employee_id), err)]
pub async fn create_initial_admin_user(config: &Config, db: &PgPool) -> anyhow::Result<Option<UserId>> {
    let Some(admin_password) = config.admin_password.clone() else {
        warn!("admin_password is not set, skipping admin bootstrap");
        return Ok(None);
    };

    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&admin_password))
        .await
        .context("admin password hashing task failed")??;

    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing_user) = user_repo.get_user_by_employee_id(&config.admin_employee_id).await? {
        user_repo.set_password_hash(existing_user.id, &password_hash).await?;
        tx.commit().await?;
        debug!(user_id = %existing_user.id, "admin password updated");
        return Ok(Some(existing_user.id));
    }

    let created_user = user_repo
        .create(&UserCreateDBRequest {
            employee_id: config.admin_employee_id.clone(),
            email: config.admin_email.clone(),
            first_name: None,
            password_hash: Some(password_hash),
            phone_number: None,
            qualification: None,
            experience: None,
            role: Role::Admin,
        })
        .await
        .context("Failed to create admin user")?;

    tx.commit().await?;
    info!(user_id = %created_user.id, "admin user created");
    Ok(Some(created_user.id))
}

/// Connect to postgres with the configured pool settings and run migrations.
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let settings = &config.pool;
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout((settings.idle_timeout_secs > 0).then(|| Duration::from_secs(settings.idle_timeout_secs)))
        .max_lifetime((settings.max_lifetime_secs > 0).then(|| Duration::from_secs(settings.max_lifetime_secs)))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    migrator().run(&pool).await?;
    Ok(pool)
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PUT, http::Method::DELETE])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the router: resource routes, `/healthz`, the Scalar docs at `/docs`, optional
/// Prometheus metrics, CORS and request tracing.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    use api::handlers::{controller_families, efficiency, jobs, lines, shifts, stations, users};

    let cors_layer = create_cors_layer(&state.config)?;
    let enable_metrics = state.config.enable_metrics;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        // Lines
        .route("/line/addline", post(lines::add_line))
        .route("/line/getall", get(lines::list_lines))
        .route("/line/get/{id}", get(lines::get_line))
        .route("/line/updateline/{id}", put(lines::update_line))
        .route("/line/deleteline/{id}", delete(lines::delete_line))
        // Shifts
        .route("/shift/addshift", post(shifts::add_shift))
        .route("/shift/getall", get(shifts::list_shifts))
        .route("/shift/get/{id}", get(shifts::get_shift))
        .route("/shift/updateshift/{id}", put(shifts::update_shift))
        // Stations and their line assignments
        .route("/station/addstation", post(stations::add_station))
        .route("/station/getall", get(stations::list_stations))
        .route("/station/get/{id}", get(stations::get_station))
        .route("/station/updatestation/{id}", put(stations::update_station))
        .route("/station/delete/{id}", delete(stations::delete_station))
        .route("/station/assignStation", post(stations::assign_station))
        .route("/station/release/{station_id}", put(stations::release_station))
        .route("/station/history/{id}", get(stations::station_history))
        .route("/station/getStationsByLine/{line_id}", get(stations::stations_by_line))
        .route("/station/getAllStations", get(stations::all_stations))
        // Controller families and their line assignments
        .route("/controller_family/add", post(controller_families::add_family))
        .route("/controller_family/getall", get(controller_families::list_families))
        .route("/controller_family/get/{id}", get(controller_families::get_family))
        .route("/controller_family/update/{id}", put(controller_families::update_family))
        .route("/controller_family/delete/{id}", delete(controller_families::delete_family))
        .route("/controller_family/assign", post(controller_families::assign_family))
        .route(
            "/controller_family/release/{controller_family_id}",
            put(controller_families::release_family),
        )
        .route("/controller_family/history/{id}", get(controller_families::family_history))
        .route("/controller_family/getAllocatedFamilies", get(controller_families::allocated_families))
        .route("/controller_family/getFreeFamilies", get(controller_families::free_families))
        // Users and sessions
        .route("/user/adduser", post(users::add_user))
        .route("/user/updateuser/{employee_id}", put(users::update_user))
        .route("/user/login", post(users::login))
        .route("/user/logout", get(users::logout))
        .route("/user/getuser", get(users::get_current_user))
        .route("/user/deleteuser/{employee_id}", delete(users::delete_user))
        .route("/user/getall", get(users::list_users))
        // Jobs
        .route("/job/start", post(jobs::start_job))
        .route("/job/complete/{job_id}", put(jobs::complete_job))
        .route("/job/get/{id}", get(jobs::get_job))
        .route("/job/getall", get(jobs::list_jobs))
        // Efficiency
        .route("/userEfficiency/getefficiency", get(efficiency::get_efficiency))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let mut router = router.layer(cors_layer);

    if enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/metrics", get(move || async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The HTTP server with its database pool.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Connect to the configured database, run migrations and build the router.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting linetrack with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;
        Self::from_pool(config, pool).await
    }

    /// Build the application over an existing pool. Migrations are still applied.
    pub async fn new_with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        migrator().run(&pool).await?;
        Self::from_pool(config, pool).await
    }

    async fn from_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        create_initial_admin_user(&config, &pool).await?;

        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(app_state)?;

        Ok(Self { router, config, pool })
    }

    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Serve until `shutdown` resolves, then close the pool and flush telemetry.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "linetrack listening on http://{}, docs at http://localhost:{}/docs",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, create_test_config};

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_bootstrap_is_idempotent(pool: PgPool) {
        let mut config = create_test_config();
        config.admin_password = Some("first-password".to_string());

        let first = create_initial_admin_user(&config, &pool).await.unwrap().unwrap();

        config.admin_password = Some("second-password".to_string());
        let second = create_initial_admin_user(&config, &pool).await.unwrap().unwrap();
        assert_eq!(first, second);

        let mut conn = pool.acquire().await.unwrap();
        let admin = Users::new(&mut conn).get_user_by_employee_id("ADMIN").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        let hash = admin.password_hash.unwrap();
        assert!(password::verify_password("second-password", &hash).unwrap());
        assert!(!password::verify_password("first-password", &hash).unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_bootstrap_skipped_without_password(pool: PgPool) {
        let config = create_test_config();
        assert!(create_initial_admin_user(&config, &pool).await.unwrap().is_none());

        let mut conn = pool.acquire().await.unwrap();
        assert!(Users::new(&mut conn).list().await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_healthz_and_docs(pool: PgPool) {
        let app = create_test_app(pool).await;

        let response = app.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");

        app.get("/docs").await.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_metrics_route_only_when_enabled(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        app.get("/metrics").await.assert_status_not_found();

        let mut config = create_test_config();
        config.enable_metrics = true;
        let app = Application::new_with_pool(config, pool).await.unwrap().into_test_server();
        app.get("/metrics").await.assert_status_ok();
    }

    #[test]
    fn test_cors_layer_accepts_configured_origins() {
        let mut config = create_test_config();
        config.auth.security.cors.allowed_origins = vec![CorsOrigin::Url("https://lines.example.com".parse().unwrap())];
        assert!(create_cors_layer(&config).is_ok());
    }
}
