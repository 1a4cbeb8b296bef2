//! API request/response models for production lines.

use crate::db::models::lines::{LineCreateDBRequest, LineDBResponse, LineUpdateDBRequest};
use crate::types::LineId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LineCreate {
    pub line_name: String,
    pub line_description: Option<String>,
}

impl From<LineCreate> for LineCreateDBRequest {
    fn from(create: LineCreate) -> Self {
        Self {
            line_name: create.line_name,
            line_description: create.line_description,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LineUpdate {
    pub line_name: Option<String>,
    pub line_description: Option<String>,
}

impl From<LineUpdate> for LineUpdateDBRequest {
    fn from(update: LineUpdate) -> Self {
        Self {
            line_name: update.line_name,
            line_description: update.line_description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LineResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: LineId,
    pub line_name: String,
    pub line_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LineDBResponse> for LineResponse {
    fn from(db: LineDBResponse) -> Self {
        Self {
            id: db.id,
            line_name: db.line_name,
            line_description: db.line_description,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
