//! Test helpers: an in-process server and fixtures inserted straight through the repositories.

use crate::{
    api::models::users::Role,
    config::{Config, PoolSettings},
    db::{
        handlers::{ControllerFamilies, Jobs, Lines, Repository, Shifts, Stations, Users, jobs::Completion},
        models::{
            controller_families::{ControllerFamilyCreateDBRequest, ControllerFamilyDBResponse},
            jobs::{JobCreateDBRequest, JobDBResponse},
            lines::{LineCreateDBRequest, LineDBResponse},
            shifts::{ShiftCreateDBRequest, ShiftDBResponse},
            stations::{StationCreateDBRequest, StationDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
    },
    types::{JobId, LineId, ShiftId, UserId},
};
use axum_test::TestServer;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::PgPool;

pub async fn create_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, pool)
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> Config {
    Config {
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        admin_password: None,
        pool: PoolSettings {
            max_connections: 1,
            min_connections: 0,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub async fn create_test_line(pool: &PgPool, name: &str) -> LineDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Lines::new(&mut conn)
        .create(&LineCreateDBRequest {
            line_name: name.to_string(),
            line_description: None,
        })
        .await
        .expect("Failed to create test line")
}

pub async fn create_test_station(pool: &PgPool, name: &str) -> StationDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Stations::new(&mut conn)
        .create(&StationCreateDBRequest {
            station_name: name.to_string(),
            station_description: None,
        })
        .await
        .expect("Failed to create test station")
}

/// `production_time` as `HH:MM:SS`
pub async fn create_test_family(pool: &PgPool, name: &str, production_time: &str) -> ControllerFamilyDBResponse {
    let production_time = NaiveTime::parse_from_str(production_time, "%H:%M:%S").expect("Invalid production time in test");
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    ControllerFamilies::new(&mut conn)
        .create(&ControllerFamilyCreateDBRequest {
            family_name: name.to_string(),
            description: None,
            production_time,
        })
        .await
        .expect("Failed to create test controller family")
}

/// An operator without a password
pub async fn create_test_user(pool: &PgPool, employee_id: &str) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            employee_id: employee_id.to_string(),
            email: format!("{employee_id}@plant.example"),
            first_name: None,
            password_hash: None,
            phone_number: None,
            qualification: None,
            experience: None,
            role: Role::Operator,
        })
        .await
        .expect("Failed to create test user")
}

pub async fn create_test_shift(pool: &PgPool) -> ShiftDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Shifts::new(&mut conn)
        .create(&ShiftCreateDBRequest {
            shift_name: "Day".to_string(),
            start_time: NaiveTime::from_hms_opt(6, 0, 0).expect("valid time"),
            end_time: NaiveTime::from_hms_opt(14, 0, 0).expect("valid time"),
        })
        .await
        .expect("Failed to create test shift")
}

/// Start a job now. `job_date` defaults to now, like the API.
pub async fn start_test_job(
    pool: &PgPool,
    line_id: LineId,
    user_id: UserId,
    shift_id: ShiftId,
    job_date: Option<DateTime<Utc>>,
) -> JobDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Jobs::new(&mut conn)
        .start(&JobCreateDBRequest {
            line_id,
            user_id,
            shift_id,
            station_id: None,
            job_date,
        })
        .await
        .expect("Failed to start test job")
}

pub async fn complete_test_job(pool: &PgPool, job_id: JobId) -> JobDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    match Jobs::new(&mut conn).complete(job_id).await.expect("Failed to complete test job") {
        Completion::Completed(job) => job,
        Completion::AlreadyCompleted(_) => panic!("test job {job_id} was already completed"),
    }
}
