use crate::types::LineId;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct LineCreateDBRequest {
    pub line_name: String,
    pub line_description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LineUpdateDBRequest {
    pub line_name: Option<String>,
    pub line_description: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LineDBResponse {
    pub id: LineId,
    pub line_name: String,
    pub line_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
