use crate::types::{ControllerFamilyId, JobId, LineId, UserId};
use chrono::{DateTime, NaiveTime, Utc};

/// A completed job joined with the controller family assigned to its line at `job_date`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EfficiencyJobRow {
    pub job_id: JobId,
    pub user_id: UserId,
    pub line_id: LineId,
    pub controller_family_id: ControllerFamilyId,
    pub family_name: String,
    pub job_date: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub production_time: NaiveTime,
    /// Number of assignments whose interval contained `job_date`; more than one means the
    /// history overlaps and the most recently started one was used.
    pub match_count: i64,
}
