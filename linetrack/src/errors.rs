use crate::db::errors::DbError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Invalid request data (missing fields, malformed dates, unparsable bodies)
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// A listing came back empty where at least one row was expected
    #[error("No {resource} found")]
    NoneFound { resource: String },

    /// Business rule conflict, e.g. completing a job twice
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        Error::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn none_found(resource: &str) -> Self {
        Error::NoneFound {
            resource: resource.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } | Error::NoneFound { .. } => StatusCode::NOT_FOUND,
            // Conflicts are reported as 400 so clients treat them like any other rejected input
            Error::Conflict { .. } => StatusCode::BAD_REQUEST,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::ActiveAssignment { .. } | DbError::LineOccupied { .. } => StatusCode::BAD_REQUEST,
                DbError::StartsBeforeCurrent { .. } | DbError::EndsInPast { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message placed in the response envelope
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::NoneFound { resource } => format!("No {resource} found"),
            Error::Conflict { message } => message.clone(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => match (table.as_deref(), constraint.as_deref()) {
                    (Some("users"), Some(c)) if c.contains("employee_id") => {
                        "A user with this employee ID already exists".to_string()
                    }
                    (Some("users"), Some(c)) if c.contains("email") => "An account with this email address already exists".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { constraint, message, .. } => match constraint.as_deref() {
                    _ if message.starts_with("update or delete") => "Resource is still referenced by recorded jobs".to_string(),
                    Some(c) if c.starts_with("jobs_") => "Referenced line, user, shift or station does not exist".to_string(),
                    _ => "Invalid reference to related resource".to_string(),
                },
                DbError::CheckViolation { constraint, .. } => match constraint.as_deref() {
                    Some(c) if c.ends_with("_interval_check") => "end_date must be after start_date".to_string(),
                    Some("jobs_end_after_start_check") => "end_time must not be before start_time".to_string(),
                    _ => "Invalid data provided".to_string(),
                },
                DbError::ActiveAssignment {
                    entity_type,
                    entity_id,
                    line_id: Some(line_id),
                } => format!("{entity_type} {entity_id} is already assigned to Line {line_id}"),
                DbError::ActiveAssignment {
                    entity_type, entity_id, ..
                } => format!("{entity_type} {entity_id} is already assigned to a line"),
                DbError::LineOccupied {
                    entity_type,
                    line_id,
                    holder_id: Some(holder_id),
                } => format!("Line {line_id} already has {entity_type} {holder_id} assigned for an overlapping period"),
                DbError::LineOccupied { entity_type, line_id, .. } => {
                    format!("Line {line_id} already has a {entity_type} assigned")
                }
                DbError::StartsBeforeCurrent {
                    entity_type,
                    entity_id,
                    line_id,
                    current_start,
                } => format!(
                    "start_date must be after {} (start of {entity_type} {entity_id} on Line {line_id})",
                    current_start.format("%Y-%m-%d %H:%M:%S")
                ),
                DbError::EndsInPast {
                    entity_type,
                    entity_id,
                    line_id,
                } => format!("end_date must be in the future while {entity_type} {entity_id} is assigned to Line {line_id}"),
                DbError::Other(e) => format!("Database query error: {e}"),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(DbError::ActiveAssignment { .. } | DbError::LineOccupied { .. }) | Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::NoneFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = json!({
            "success": false,
            "message": self.user_message(),
        });

        (status, Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_active_assignment_is_bad_request_naming_the_line() {
        let family = Uuid::new_v4();
        let line = Uuid::new_v4();
        let err = Error::Database(DbError::ActiveAssignment {
            entity_type: "Controller Family",
            entity_id: family,
            line_id: Some(line),
        });

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.user_message(),
            format!("Controller Family {family} is already assigned to Line {line}")
        );
    }

    #[test]
    fn test_line_occupied_names_the_holder_when_known() {
        let line = Uuid::new_v4();
        let family = Uuid::new_v4();
        let known = Error::Database(DbError::LineOccupied {
            entity_type: "Controller Family",
            line_id: line,
            holder_id: Some(family),
        });
        assert_eq!(known.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            known.user_message(),
            format!("Line {line} already has Controller Family {family} assigned for an overlapping period")
        );

        let unknown = Error::Database(DbError::LineOccupied {
            entity_type: "Controller Family",
            line_id: line,
            holder_id: None,
        });
        assert_eq!(unknown.user_message(), format!("Line {line} already has a Controller Family assigned"));
    }

    #[test]
    fn test_database_errors_carry_driver_text() {
        let err = Error::Database(DbError::Other(anyhow::anyhow!("connection reset")));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Database query error: connection reset");
    }

    #[test]
    fn test_status_codes_follow_taxonomy() {
        let cases = [
            (Error::BadRequest { message: "x".into() }, StatusCode::BAD_REQUEST),
            (
                Error::NotFound {
                    resource: "Line".into(),
                    id: "1".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (Error::NoneFound { resource: "Lines".into() }, StatusCode::NOT_FOUND),
            (Error::Conflict { message: "x".into() }, StatusCode::BAD_REQUEST),
            (Error::Unauthenticated { message: None }, StatusCode::UNAUTHORIZED),
            (Error::Database(DbError::NotFound), StatusCode::NOT_FOUND),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_code(), expected, "{err}");
        }
    }
}
