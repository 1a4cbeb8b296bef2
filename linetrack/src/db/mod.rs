//! Database layer for data persistence and access.
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (api::handlers - HTTP request handlers)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries and transactions)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! Migrations live in `migrations/` and are embedded through [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
