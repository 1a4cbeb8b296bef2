//! API request/response models for controller families.
//!
//! `production_time` travels as `HH:MM:SS` and is the expected duration of one job.

use crate::datetime::parse_clock_time;
use crate::db::models::controller_families::{ControllerFamilyCreateDBRequest, ControllerFamilyDBResponse, ControllerFamilyUpdateDBRequest};
use crate::errors::Error;
use crate::types::ControllerFamilyId;
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ControllerFamilyCreate {
    pub family_name: String,
    pub description: Option<String>,
    #[schema(example = "01:30:00")]
    pub production_time: String,
}

impl TryFrom<ControllerFamilyCreate> for ControllerFamilyCreateDBRequest {
    type Error = Error;

    fn try_from(create: ControllerFamilyCreate) -> Result<Self, Error> {
        Ok(Self {
            production_time: parse_clock_time("production_time", &create.production_time)?,
            family_name: create.family_name,
            description: create.description,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ControllerFamilyUpdate {
    pub family_name: Option<String>,
    pub description: Option<String>,
    pub production_time: Option<String>,
}

impl TryFrom<ControllerFamilyUpdate> for ControllerFamilyUpdateDBRequest {
    type Error = Error;

    fn try_from(update: ControllerFamilyUpdate) -> Result<Self, Error> {
        Ok(Self {
            production_time: update
                .production_time
                .as_deref()
                .map(|t| parse_clock_time("production_time", t))
                .transpose()?,
            family_name: update.family_name,
            description: update.description,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ControllerFamilyResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ControllerFamilyId,
    pub family_name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "01:30:00")]
    pub production_time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ControllerFamilyDBResponse> for ControllerFamilyResponse {
    fn from(db: ControllerFamilyDBResponse) -> Self {
        Self {
            id: db.id,
            family_name: db.family_name,
            description: db.description,
            production_time: db.production_time,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_time_must_be_hh_mm_ss() {
        let create = ControllerFamilyCreate {
            family_name: "CF-90".to_string(),
            description: None,
            production_time: "90 minutes".to_string(),
        };
        let err = ControllerFamilyCreateDBRequest::try_from(create).unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));

        let update = ControllerFamilyUpdate {
            production_time: Some("01:30:00".to_string()),
            ..Default::default()
        };
        let request = ControllerFamilyUpdateDBRequest::try_from(update).unwrap();
        assert_eq!(request.production_time, NaiveTime::from_hms_opt(1, 30, 0));
    }
}
