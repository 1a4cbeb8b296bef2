//! API request/response models for users and sessions.

use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Supervisor,
    Operator,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    pub employee_id: String,
    pub email: String,
    pub first_name: Option<String>,
    /// Stored as an argon2 hash. Users without a password cannot log in.
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub role: Role,
}

/// Partial update; at least one field must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub role: Option<Role>,
}

/// A user as returned by the API. The password hash is never included.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub employee_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub phone_number: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            employee_id: db.employee_id,
            email: db.email,
            first_name: db.first_name,
            phone_number: db.phone_number,
            qualification: db.qualification,
            experience: db.experience,
            role: db.role,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub employee_id: String,
    pub password: String,
}

/// Login result. The token is also set as the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// The authenticated caller, decoded from the session token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub employee_id: String,
    pub role: Role,
    pub first_name: Option<String>,
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            employee_id: db.employee_id,
            role: db.role,
            first_name: db.first_name,
        }
    }
}
