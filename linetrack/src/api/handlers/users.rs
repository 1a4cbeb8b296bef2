//! User accounts and sessions.
//!
//! Users are addressed by `employee_id` on the wire. Login verifies the argon2 hash and
//! issues a JWT, which is both returned in the body and set as the session cookie.

use crate::{
    AppState,
    api::{
        extract::{ApiJson, ApiPath},
        models::{
            envelope::ApiResponse,
            users::{CurrentUser, LoginRequest, LoginResponse, UserCreate, UserResponse, UserUpdate},
        },
    },
    auth::{password, session},
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
};

async fn hash_in_background(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })?
}

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid employee ID or password".to_string()),
    }
}

#[utoipa::path(
    post,
    path = "/user/adduser",
    tag = "users",
    summary = "Create a user",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request or duplicate employee ID / email"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn add_user(
    State(state): State<AppState>,
    ApiJson(create): ApiJson<UserCreate>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    let password_hash = match create.password {
        Some(password) => Some(hash_in_background(password).await?),
        None => None,
    };

    let request = UserCreateDBRequest {
        employee_id: create.employee_id,
        email: create.email,
        first_name: create.first_name,
        password_hash,
        phone_number: create.phone_number,
        qualification: create.qualification,
        experience: create.experience,
        role: create.role,
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).create(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(UserResponse::from(user)).with_message("User created successfully")),
    ))
}

#[utoipa::path(
    put,
    path = "/user/updateuser/{employee_id}",
    tag = "users",
    summary = "Update a user",
    params(("employee_id" = String, Path, description = "Employee ID")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Empty update"),
        (status = 404, description = "User not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(employee_id): ApiPath<String>,
    ApiJson(update): ApiJson<UserUpdate>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let password_hash = match update.password {
        Some(password) => Some(hash_in_background(password).await?),
        None => None,
    };

    let request = UserUpdateDBRequest {
        email: update.email,
        first_name: update.first_name,
        password_hash,
        phone_number: update.phone_number,
        qualification: update.qualification,
        experience: update.experience,
        role: update.role,
    };
    if request.is_empty() {
        return Err(Error::BadRequest {
            message: "At least one field is required for update".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);
    let user = repo
        .get_user_by_employee_id(&employee_id)
        .await?
        .ok_or_else(|| Error::not_found("User", &employee_id))?;
    let user = repo.update(user.id, &request).await?;

    Ok(Json(ApiResponse::data(UserResponse::from(user)).with_message("User updated successfully")))
}

#[utoipa::path(
    post,
    path = "/user/login",
    tag = "users",
    summary = "Log in with employee ID and password",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<ApiResponse<LoginResponse>>)> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_user_by_employee_id(&request.employee_id)
        .await?
        .ok_or_else(invalid_credentials)?;

    let hash = user.password_hash.clone().ok_or_else(invalid_credentials)?;
    let password = request.password;
    let is_valid = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(invalid_credentials());
    }

    let current_user = CurrentUser::from(user.clone());
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = session::session_cookie(&token, &state.config);

    let body = LoginResponse {
        token,
        user: UserResponse::from(user),
    };
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::data(body).with_message("Login successful")),
    ))
}

#[utoipa::path(
    get,
    path = "/user/logout",
    tag = "users",
    summary = "Clear the session cookie",
    responses(
        (status = 200, description = "Logout successful"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> ([(header::HeaderName, String); 1], Json<ApiResponse<()>>) {
    (
        [(header::SET_COOKIE, session::cleared_session_cookie(&state.config))],
        Json(ApiResponse::message("Logout successful")),
    )
}

#[utoipa::path(
    get,
    path = "/user/getuser",
    tag = "users",
    summary = "The logged-in user",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponse>),
        (status = 401, description = "No valid session"),
    ),
    security(
        ("BearerAuth" = []),
        ("CookieAuth" = []),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_current_user(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<ApiResponse<UserResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    // the token can outlive the account
    let user = Users::new(&mut conn)
        .get_by_id(current_user.id)
        .await?
        .ok_or_else(|| Error::not_found("User", &current_user.employee_id))?;

    Ok(Json(ApiResponse::data(user.into())))
}

#[utoipa::path(
    delete,
    path = "/user/deleteuser/{employee_id}",
    tag = "users",
    summary = "Delete a user",
    params(("employee_id" = String, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user(State(state): State<AppState>, ApiPath(employee_id): ApiPath<String>) -> Result<Json<ApiResponse<()>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);
    let user = repo
        .get_user_by_employee_id(&employee_id)
        .await?
        .ok_or_else(|| Error::not_found("User", &employee_id))?;

    if !repo.delete(user.id).await? {
        return Err(Error::not_found("User", &employee_id));
    }
    Ok(Json(ApiResponse::message("User deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/user/getall",
    tag = "users",
    summary = "List users",
    responses(
        (status = 200, description = "All users", body = ApiResponse<Vec<UserResponse>>),
        (status = 404, description = "No users exist"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<UserResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let users = Users::new(&mut conn).list().await?;

    if users.is_empty() {
        return Err(Error::none_found("Users"));
    }
    Ok(Json(ApiResponse::data(users.into_iter().map(UserResponse::from).collect())))
}
