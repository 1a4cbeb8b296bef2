//! Common type definitions.
//!
//! All entity IDs are UUIDs wrapped in type aliases so signatures say which table an ID
//! belongs to:
//!
//! - [`UserId`]: Operator / supervisor account
//! - [`ShiftId`]: Shift definition
//! - [`LineId`]: Production line
//! - [`StationId`]: Work station that can be assigned to a line
//! - [`ControllerFamilyId`]: Controller family that can be assigned to a line
//! - [`AssignmentId`]: Row in one of the line assignment tables
//! - [`JobId`]: Job execution record
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type ShiftId = Uuid;
pub type LineId = Uuid;
pub type StationId = Uuid;
pub type ControllerFamilyId = Uuid;
pub type AssignmentId = Uuid;
pub type JobId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}
