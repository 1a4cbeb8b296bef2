use crate::types::StationId;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct StationCreateDBRequest {
    pub station_name: String,
    pub station_description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StationUpdateDBRequest {
    pub station_name: Option<String>,
    pub station_description: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StationDBResponse {
    pub id: StationId,
    pub station_name: String,
    pub station_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
