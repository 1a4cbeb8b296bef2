//! API request/response models for stations.

use crate::db::models::stations::{StationCreateDBRequest, StationDBResponse, StationUpdateDBRequest};
use crate::types::StationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StationCreate {
    pub station_name: String,
    pub station_description: Option<String>,
}

impl From<StationCreate> for StationCreateDBRequest {
    fn from(create: StationCreate) -> Self {
        Self {
            station_name: create.station_name,
            station_description: create.station_description,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct StationUpdate {
    pub station_name: Option<String>,
    pub station_description: Option<String>,
}

impl From<StationUpdate> for StationUpdateDBRequest {
    fn from(update: StationUpdate) -> Self {
        Self {
            station_name: update.station_name,
            station_description: update.station_description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: StationId,
    pub station_name: String,
    pub station_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StationDBResponse> for StationResponse {
    fn from(db: StationDBResponse) -> Self {
        Self {
            id: db.id,
            station_name: db.station_name,
            station_description: db.station_description,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
