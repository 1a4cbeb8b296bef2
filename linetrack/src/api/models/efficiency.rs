//! API models for the efficiency report.

use crate::db::models::efficiency::EfficiencyJobRow;
use crate::efficiency::Durations;
use crate::types::{ControllerFamilyId, JobId, LineId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Identifies whose efficiency to compute. Sent as a JSON body or as a query parameter.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct EfficiencyQuery {
    #[param(value_type = Option<String>, format = "uuid")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,
}

/// One completed job compared against the baseline of the controller family that was
/// assigned to its line at `job_date`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EfficiencyRecord {
    #[schema(value_type = String, format = "uuid")]
    pub job_id: JobId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub line_id: LineId,
    #[schema(value_type = String, format = "uuid")]
    pub controller_family_id: ControllerFamilyId,
    pub family_name: String,
    pub job_date: DateTime<Utc>,
    pub actual_time_seconds: i64,
    pub expected_time_seconds: i64,
    pub actual_time_minutes: f64,
    pub expected_time_minutes: f64,
    /// `actual - expected`; positive when the job ran over
    pub deviation_seconds: i64,
    /// `expected / actual`, null for zero-length jobs
    pub efficiency: Option<f64>,
}

impl From<EfficiencyJobRow> for EfficiencyRecord {
    fn from(row: EfficiencyJobRow) -> Self {
        let durations = Durations::measure(row.start_time, row.end_time, row.production_time);
        Self {
            job_id: row.job_id,
            user_id: row.user_id,
            line_id: row.line_id,
            controller_family_id: row.controller_family_id,
            family_name: row.family_name,
            job_date: row.job_date,
            actual_time_seconds: durations.actual_seconds,
            expected_time_seconds: durations.expected_seconds,
            actual_time_minutes: durations.actual_minutes(),
            expected_time_minutes: durations.expected_minutes(),
            deviation_seconds: durations.deviation_seconds(),
            efficiency: durations.efficiency(),
        }
    }
}
