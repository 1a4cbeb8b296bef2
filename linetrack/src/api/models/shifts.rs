//! API request/response models for shifts.

use crate::datetime::parse_clock_time;
use crate::db::models::shifts::{ShiftCreateDBRequest, ShiftDBResponse, ShiftUpdateDBRequest};
use crate::errors::Error;
use crate::types::ShiftId;
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShiftCreate {
    pub shift_name: String,
    /// `HH:MM:SS`
    pub start_time: String,
    /// `HH:MM:SS`
    pub end_time: String,
}

impl TryFrom<ShiftCreate> for ShiftCreateDBRequest {
    type Error = Error;

    fn try_from(create: ShiftCreate) -> Result<Self, Error> {
        Ok(Self {
            start_time: parse_clock_time("start_time", &create.start_time)?,
            end_time: parse_clock_time("end_time", &create.end_time)?,
            shift_name: create.shift_name,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ShiftUpdate {
    pub shift_name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl TryFrom<ShiftUpdate> for ShiftUpdateDBRequest {
    type Error = Error;

    fn try_from(update: ShiftUpdate) -> Result<Self, Error> {
        Ok(Self {
            start_time: update.start_time.as_deref().map(|t| parse_clock_time("start_time", t)).transpose()?,
            end_time: update.end_time.as_deref().map(|t| parse_clock_time("end_time", t)).transpose()?,
            shift_name: update.shift_name,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShiftResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ShiftId,
    pub shift_name: String,
    #[schema(value_type = String, example = "06:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "14:00:00")]
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ShiftDBResponse> for ShiftResponse {
    fn from(db: ShiftDBResponse) -> Self {
        Self {
            id: db.id,
            shift_name: db.shift_name,
            start_time: db.start_time,
            end_time: db.end_time,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
