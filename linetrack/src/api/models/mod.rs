//! API request and response data models.
//!
//! These are the public wire contract and are kept separate from [`crate::db::models`].
//! Conversions into database requests parse and validate client-supplied strings (dates,
//! `HH:MM:SS` times) and fail with [`crate::errors::Error::BadRequest`].
//!
//! - [`envelope`]: the `{success, message, data}` wrapper
//! - [`users`]: users, roles, login and the session user
//! - [`shifts`], [`lines`], [`stations`], [`controller_families`]: reference data
//! - [`assignments`]: assign requests, assignment rows, free/allocated listings
//! - [`jobs`]: job start and status
//! - [`efficiency`]: per-job efficiency records

pub mod assignments;
pub mod controller_families;
pub mod efficiency;
pub mod envelope;
pub mod jobs;
pub mod lines;
pub mod shifts;
pub mod stations;
pub mod users;
