use crate::types::ShiftId;
use chrono::{DateTime, NaiveTime, Utc};

#[derive(Debug, Clone)]
pub struct ShiftCreateDBRequest {
    pub shift_name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Default)]
pub struct ShiftUpdateDBRequest {
    pub shift_name: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShiftDBResponse {
    pub id: ShiftId,
    pub shift_name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
