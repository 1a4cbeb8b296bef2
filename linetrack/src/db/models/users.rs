//! Database models for users.

use crate::api::models::users::Role;
use crate::types::UserId;
use chrono::{DateTime, Utc};

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub employee_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub password_hash: Option<String>,
    pub phone_number: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub role: Role,
}

/// Database request for updating a user. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub password_hash: Option<String>,
    pub phone_number: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub role: Option<Role>,
}

impl UserUpdateDBRequest {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.password_hash.is_none()
            && self.phone_number.is_none()
            && self.qualification.is_none()
            && self.experience.is_none()
            && self.role.is_none()
    }
}

/// Database response for a user
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub employee_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub password_hash: Option<String>,
    pub phone_number: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
