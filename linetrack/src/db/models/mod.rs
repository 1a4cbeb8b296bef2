//! Database record models matching table schemas.
//!
//! These structs correspond to table rows and are what repositories accept and return.
//! They are kept separate from the API models so storage and wire representations can
//! evolve independently.
//!
//! - [`users`]: Operator and supervisor accounts
//! - [`shifts`]: Shift definitions
//! - [`lines`], [`stations`], [`controller_families`]: Assignable resources and the lines
//!   they are assigned to
//! - [`assignments`]: Time-bounded line assignments and their conflict policies
//! - [`jobs`]: Job execution records
//! - [`efficiency`]: Rows feeding the efficiency computation

pub mod assignments;
pub mod controller_families;
pub mod efficiency;
pub mod jobs;
pub mod lines;
pub mod shifts;
pub mod stations;
pub mod users;
