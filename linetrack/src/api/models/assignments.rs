//! API request/response models for line assignments.
//!
//! Interval bounds are accepted as strings in any of the formats of [`crate::datetime`] so
//! that a malformed date is a 400 with a useful message rather than a JSON rejection.

use crate::api::models::stations::StationResponse;
use crate::datetime::parse_optional_timestamp;
use crate::db::handlers::assignments::Closed;
use crate::db::models::assignments::{AllocatedResourceDBResponse, AssignOutcome, AssignmentCreateDBRequest, AssignmentDBResponse};
use crate::errors::Error;
use crate::types::{AssignmentId, ControllerFamilyId, LineId, StationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Parse both bounds and check `end_date > start_date` when both are given.
fn interval_request(
    resource_id: Uuid,
    line_id: LineId,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<AssignmentCreateDBRequest, Error> {
    let start_date = parse_optional_timestamp("start_date", start_date)?;
    let end_date = parse_optional_timestamp("end_date", end_date)?;

    if let (Some(start), Some(end)) = (start_date, end_date)
        && end <= start
    {
        return Err(Error::BadRequest {
            message: "end_date must be after start_date".to_string(),
        });
    }

    Ok(AssignmentCreateDBRequest {
        resource_id,
        line_id,
        start_date,
        end_date,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FamilyAssignRequest {
    #[schema(value_type = String, format = "uuid")]
    pub line_id: LineId,
    #[schema(value_type = String, format = "uuid")]
    pub controller_family_id: ControllerFamilyId,
    /// Defaults to now
    #[schema(example = "2026-03-01 06:00:00")]
    pub start_date: Option<String>,
    /// Open-ended when absent
    pub end_date: Option<String>,
}

impl TryFrom<&FamilyAssignRequest> for AssignmentCreateDBRequest {
    type Error = Error;

    fn try_from(request: &FamilyAssignRequest) -> Result<Self, Error> {
        interval_request(
            request.controller_family_id,
            request.line_id,
            request.start_date.as_deref(),
            request.end_date.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StationAssignRequest {
    #[schema(value_type = String, format = "uuid")]
    pub line_id: LineId,
    #[schema(value_type = String, format = "uuid")]
    pub station_id: StationId,
    /// Defaults to now
    pub start_date: Option<String>,
    /// Open-ended when absent
    pub end_date: Option<String>,
}

impl TryFrom<&StationAssignRequest> for AssignmentCreateDBRequest {
    type Error = Error;

    fn try_from(request: &StationAssignRequest) -> Result<Self, Error> {
        interval_request(request.station_id, request.line_id, request.start_date.as_deref(), request.end_date.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FamilyAssignmentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AssignmentId,
    #[schema(value_type = String, format = "uuid")]
    pub line_id: LineId,
    #[schema(value_type = String, format = "uuid")]
    pub controller_family_id: ControllerFamilyId,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<AssignmentDBResponse> for FamilyAssignmentResponse {
    fn from(db: AssignmentDBResponse) -> Self {
        Self {
            id: db.id,
            line_id: db.line_id,
            controller_family_id: db.resource_id,
            start_date: db.start_date,
            end_date: db.end_date,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StationAssignmentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AssignmentId,
    #[schema(value_type = String, format = "uuid")]
    pub line_id: LineId,
    #[schema(value_type = String, format = "uuid")]
    pub station_id: StationId,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Previous assignments of the station closed by this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schema(value_type = Vec<String>)]
    pub closed: Vec<AssignmentId>,
    /// Previous assignments that had not started yet and were cancelled
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schema(value_type = Vec<String>)]
    pub cancelled: Vec<AssignmentId>,
}

impl From<AssignmentDBResponse> for StationAssignmentResponse {
    fn from(db: AssignmentDBResponse) -> Self {
        Self {
            id: db.id,
            line_id: db.line_id,
            station_id: db.resource_id,
            start_date: db.start_date,
            end_date: db.end_date,
            created_at: db.created_at,
            closed: Vec::new(),
            cancelled: Vec::new(),
        }
    }
}

impl From<AssignOutcome> for StationAssignmentResponse {
    fn from(outcome: AssignOutcome) -> Self {
        Self {
            closed: outcome.closed,
            cancelled: outcome.cancelled,
            ..StationAssignmentResponse::from(outcome.assignment)
        }
    }
}

/// An active (line, controller family) pair
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AllocatedFamilyResponse {
    #[schema(value_type = String, format = "uuid")]
    pub assignment_id: AssignmentId,
    #[schema(value_type = String, format = "uuid")]
    pub line_id: LineId,
    pub line_name: String,
    #[schema(value_type = String, format = "uuid")]
    pub controller_family_id: ControllerFamilyId,
    pub family_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl From<AllocatedResourceDBResponse> for AllocatedFamilyResponse {
    fn from(db: AllocatedResourceDBResponse) -> Self {
        Self {
            assignment_id: db.assignment_id,
            line_id: db.line_id,
            line_name: db.line_name,
            controller_family_id: db.resource_id,
            family_name: db.resource_name,
            start_date: db.start_date,
            end_date: db.end_date,
        }
    }
}

/// An active (line, station) pair
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AllocatedStationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub assignment_id: AssignmentId,
    #[schema(value_type = String, format = "uuid")]
    pub line_id: LineId,
    pub line_name: String,
    #[schema(value_type = String, format = "uuid")]
    pub station_id: StationId,
    pub station_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl From<AllocatedResourceDBResponse> for AllocatedStationResponse {
    fn from(db: AllocatedResourceDBResponse) -> Self {
        Self {
            assignment_id: db.assignment_id,
            line_id: db.line_id,
            line_name: db.line_name,
            station_id: db.resource_id,
            station_name: db.resource_name,
            start_date: db.start_date,
            end_date: db.end_date,
        }
    }
}

/// Every station, split by whether it currently holds an active assignment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StationPartition {
    pub free: Vec<StationResponse>,
    pub allocated: Vec<AllocatedStationResponse>,
}

/// Assignments ended by a release
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReleaseResponse {
    #[schema(value_type = Vec<String>)]
    pub closed: Vec<AssignmentId>,
    #[schema(value_type = Vec<String>)]
    pub cancelled: Vec<AssignmentId>,
}

impl From<Closed> for ReleaseResponse {
    fn from(closed: Closed) -> Self {
        Self {
            closed: closed.closed,
            cancelled: closed.cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family_request(start: Option<&str>, end: Option<&str>) -> FamilyAssignRequest {
        FamilyAssignRequest {
            line_id: Uuid::new_v4(),
            controller_family_id: Uuid::new_v4(),
            start_date: start.map(str::to_string),
            end_date: end.map(str::to_string),
        }
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let request = family_request(Some("2026-03-02 06:00:00"), Some("2026-03-01 06:00:00"));
        let err = AssignmentCreateDBRequest::try_from(&request).unwrap_err();
        assert_eq!(err.user_message(), "end_date must be after start_date");
    }

    #[test]
    fn test_mixed_formats_and_empty_bounds() {
        let request = family_request(Some("03/01/2026, 6:00 AM"), Some(""));
        let db = AssignmentCreateDBRequest::try_from(&request).unwrap();
        assert_eq!(db.start_date.unwrap().to_rfc3339(), "2026-03-01T06:00:00+00:00");
        assert!(db.end_date.is_none());
        assert_eq!(db.resource_id, request.controller_family_id);
    }

    #[test]
    fn test_malformed_date_names_the_field() {
        let request = family_request(Some("next tuesday"), None);
        let err = AssignmentCreateDBRequest::try_from(&request).unwrap_err();
        assert!(err.user_message().contains("start_date"));
    }
}
