//! Database models for time-bounded line assignments.
//!
//! An assignment links a resource (a controller family or a station) to a line over the
//! half-open interval `[start_date, end_date)`. `end_date = NULL` means open-ended. A row is
//! *active* while `end_date IS NULL OR end_date > NOW()`, and each resource has at most one
//! active row at any instant.
//!
//! Both assignment tables share one shape, so the repository is generic over an
//! [`AssignmentKind`] that names the tables and columns and fixes the conflict policy.

use crate::db::models::{controller_families::ControllerFamilyDBResponse, stations::StationDBResponse};
use crate::types::{AssignmentId, LineId};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use uuid::Uuid;

/// What `assign` does when the resource already holds an active assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Fail with a conflict naming the line that currently holds the resource.
    Reject,
    /// Close the running assignment at the new start (or `NOW()`, whichever is earlier),
    /// cancel any that has not started yet, and insert the new one in the same transaction.
    /// A new start at or before the running assignment's start is rejected.
    Supersede,
}

/// Static description of one assignment table.
pub trait AssignmentKind: Send + Sync + 'static {
    /// Row type of the resource table, returned from free-resource listings
    type Resource: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin;

    /// Human readable resource name used in error messages
    const RESOURCE: &'static str;
    const TABLE: &'static str;
    const RESOURCE_TABLE: &'static str;
    const RESOURCE_COLUMN: &'static str;
    const RESOURCE_NAME_COLUMN: &'static str;
    /// Partial unique index over open intervals, `WHERE end_date IS NULL`
    const OPEN_INDEX: &'static str;
    /// Set when a line may hold only one resource of this kind at a time. Names the partial
    /// unique index over the line's open intervals.
    const LINE_INDEX: Option<&'static str>;
    const POLICY: ConflictPolicy;
}

/// Controller families are never moved implicitly: a family producing on one line must be
/// released before it can be assigned elsewhere. A line builds one family at a time, so
/// family intervals on the same line never overlap.
#[derive(Debug, Clone, Copy)]
pub struct ControllerFamilyLink;

impl AssignmentKind for ControllerFamilyLink {
    type Resource = ControllerFamilyDBResponse;

    const RESOURCE: &'static str = "Controller Family";
    const TABLE: &'static str = "line_controller_family_assignments";
    const RESOURCE_TABLE: &'static str = "controller_families";
    const RESOURCE_COLUMN: &'static str = "controller_family_id";
    const RESOURCE_NAME_COLUMN: &'static str = "family_name";
    const OPEN_INDEX: &'static str = "line_controller_family_assignments_open_unique";
    const LINE_INDEX: Option<&'static str> = Some("line_controller_family_assignments_line_open_unique");
    const POLICY: ConflictPolicy = ConflictPolicy::Reject;
}

/// Stations are physical benches that get moved between lines; the latest assignment wins.
#[derive(Debug, Clone, Copy)]
pub struct StationLink;

impl AssignmentKind for StationLink {
    type Resource = StationDBResponse;

    const RESOURCE: &'static str = "Station";
    const TABLE: &'static str = "line_station_assignments";
    const RESOURCE_TABLE: &'static str = "stations";
    const RESOURCE_COLUMN: &'static str = "station_id";
    const RESOURCE_NAME_COLUMN: &'static str = "station_name";
    const OPEN_INDEX: &'static str = "line_station_assignments_open_unique";
    const LINE_INDEX: Option<&'static str> = None;
    const POLICY: ConflictPolicy = ConflictPolicy::Supersede;
}

#[derive(Debug, Clone)]
pub struct AssignmentCreateDBRequest {
    pub resource_id: Uuid,
    pub line_id: LineId,
    /// Defaults to `NOW()` when absent
    pub start_date: Option<DateTime<Utc>>,
    /// Open-ended when absent
    pub end_date: Option<DateTime<Utc>>,
}

/// One assignment row; the resource column is aliased to `resource_id`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssignmentDBResponse {
    pub id: AssignmentId,
    pub line_id: LineId,
    pub resource_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful `assign`
#[derive(Debug, Clone)]
pub struct AssignOutcome {
    pub assignment: AssignmentDBResponse,
    /// Previously active assignments that were closed at the new start or `NOW()`, whichever
    /// is earlier (supersede only)
    pub closed: Vec<AssignmentId>,
    /// Previously active assignments that had not started yet and were removed (supersede only)
    pub cancelled: Vec<AssignmentId>,
}

/// An active assignment joined with the line and resource names
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AllocatedResourceDBResponse {
    pub assignment_id: AssignmentId,
    pub line_id: LineId,
    pub line_name: String,
    pub resource_id: Uuid,
    pub resource_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}
