//! Database models for jobs.

use crate::api::models::jobs::JobStatus;
use crate::types::{JobId, LineId, ShiftId, StationId, UserId};
use chrono::{DateTime, Utc};

/// Database request for starting a job. `start_time` is always `NOW()`.
#[derive(Debug, Clone)]
pub struct JobCreateDBRequest {
    pub line_id: LineId,
    pub user_id: UserId,
    pub shift_id: ShiftId,
    pub station_id: Option<StationId>,
    /// Defaults to `NOW()` when absent
    pub job_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub user_id: Option<UserId>,
    pub status: Option<JobStatus>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobDBResponse {
    pub id: JobId,
    pub line_id: LineId,
    pub user_id: UserId,
    pub shift_id: ShiftId,
    pub station_id: Option<StationId>,
    pub job_date: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}
