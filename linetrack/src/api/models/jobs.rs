//! API request/response models for jobs.

use crate::datetime::parse_optional_timestamp;
use crate::db::models::jobs::{JobCreateDBRequest, JobDBResponse, JobFilter};
use crate::errors::Error;
use crate::types::{JobId, LineId, ShiftId, StationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Open,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StartJob {
    #[schema(value_type = String, format = "uuid")]
    pub line_id: LineId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub shift_id: ShiftId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub station_id: Option<StationId>,
    /// Timestamp used to resolve the line's controller family. Defaults to now.
    pub job_date: Option<String>,
}

impl TryFrom<StartJob> for JobCreateDBRequest {
    type Error = Error;

    fn try_from(start: StartJob) -> Result<Self, Error> {
        Ok(Self {
            job_date: parse_optional_timestamp("job_date", start.job_date.as_deref())?,
            line_id: start.line_id,
            user_id: start.user_id,
            shift_id: start.shift_id,
            station_id: start.station_id,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListJobsQuery {
    #[param(value_type = Option<String>, format = "uuid")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,
    pub status: Option<JobStatus>,
}

impl From<ListJobsQuery> for JobFilter {
    fn from(query: ListJobsQuery) -> Self {
        Self {
            user_id: query.user_id,
            status: query.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: JobId,
    #[schema(value_type = String, format = "uuid")]
    pub line_id: LineId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub shift_id: ShiftId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub station_id: Option<StationId>,
    pub job_date: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: JobStatus,
}

impl From<JobDBResponse> for JobResponse {
    fn from(db: JobDBResponse) -> Self {
        Self {
            id: db.id,
            line_id: db.line_id,
            user_id: db.user_id,
            shift_id: db.shift_id,
            station_id: db.station_id,
            job_date: db.job_date,
            start_time: db.start_time,
            end_time: db.end_time,
            status: db.status,
        }
    }
}
