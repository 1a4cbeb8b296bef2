//! HTTP request handlers, one module per resource.

pub mod assignments;
pub mod controller_families;
pub mod efficiency;
pub mod jobs;
pub mod lines;
pub mod shifts;
pub mod stations;
pub mod users;
