//! HTTP surface: axum handlers, request/response models and the extractors they share.
//!
//! Handlers live in [`handlers`], one module per resource, and talk to the database through
//! the repositories in [`crate::db::handlers`]. Every response uses the
//! [`models::envelope::ApiResponse`] envelope.

pub mod extract;
pub mod handlers;
pub mod models;
