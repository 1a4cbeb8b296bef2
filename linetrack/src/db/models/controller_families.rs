//! Database models for controller families.
//!
//! `production_time` is stored as a `TIME` but means an elapsed duration: the time one
//! unit of the family is expected to take on the line.

use crate::types::ControllerFamilyId;
use chrono::{DateTime, NaiveTime, Utc};

#[derive(Debug, Clone)]
pub struct ControllerFamilyCreateDBRequest {
    pub family_name: String,
    pub description: Option<String>,
    pub production_time: NaiveTime,
}

#[derive(Debug, Clone, Default)]
pub struct ControllerFamilyUpdateDBRequest {
    pub family_name: Option<String>,
    pub description: Option<String>,
    pub production_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ControllerFamilyDBResponse {
    pub id: ControllerFamilyId,
    pub family_name: String,
    pub description: Option<String>,
    pub production_time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
