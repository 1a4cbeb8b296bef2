use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::types::LineId;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Check constraint violation
    #[error("Check constraint violation")]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// The resource already holds an active line assignment.
    ///
    /// `line_id` is `None` when the conflict was detected by the open-interval unique index
    /// rather than by the pre-insert check, in which case the holder is not known.
    #[error("{entity_type} {entity_id} is already assigned to a line")]
    ActiveAssignment {
        entity_type: &'static str,
        entity_id: Uuid,
        line_id: Option<LineId>,
    },

    /// The line already holds an assignment of this kind overlapping the requested interval.
    ///
    /// `holder_id` is `None` when the conflict was detected by the per-line open-interval
    /// index rather than by the overlap check.
    #[error("Line {line_id} already has a {entity_type} assigned")]
    LineOccupied {
        entity_type: &'static str,
        line_id: LineId,
        holder_id: Option<Uuid>,
    },

    /// A move would start at or before the start of the assignment it replaces
    #[error("{entity_type} {entity_id} cannot be moved to a start before its current assignment")]
    StartsBeforeCurrent {
        entity_type: &'static str,
        entity_id: Uuid,
        line_id: LineId,
        current_start: DateTime<Utc>,
    },

    /// A move that lies entirely in the past would leave the resource unassigned even though
    /// its current assignment is still running
    #[error("{entity_type} {entity_id} cannot be moved for an interval that has already ended")]
    EndsInPast {
        entity_type: &'static str,
        entity_id: Uuid,
        line_id: LineId,
    },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DbError {
    /// Name of the violated constraint, for unique/foreign-key/check violations
    pub fn constraint(&self) -> Option<&str> {
        match self {
            DbError::UniqueViolation { constraint, .. }
            | DbError::ForeignKeyViolation { constraint, .. }
            | DbError::CheckViolation { constraint, .. } => constraint.as_deref(),
            _ => None,
        }
    }
}

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    DbError::UniqueViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else {
                    // All other database errors are non-recoverable - convert to anyhow
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            // All other sqlx errors are non-recoverable - convert to anyhow with context
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
