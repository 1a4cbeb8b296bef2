//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed `PgConnection` (a pooled connection or an open
//! transaction) and returns the records from [`crate::db::models`]. The plain CRUD
//! repositories implement [`Repository`].
//!
//! - [`Users`], [`Shifts`], [`Lines`], [`Stations`], [`ControllerFamilies`]: CRUD over the
//!   reference tables
//! - [`Assignments`]: time-bounded line assignments, generic over the assignment kind
//! - [`Jobs`]: job start and completion
//! - [`Efficiency`]: completed jobs joined with their controller family baseline
//!
//! ```ignore
//! use linetrack::db::handlers::{Lines, Repository};
//!
//! let mut conn = pool.acquire().await?;
//! let lines = Lines::new(&mut conn).list().await?;
//! ```

pub mod assignments;
pub mod controller_families;
pub mod efficiency;
pub mod jobs;
pub mod lines;
pub mod repository;
pub mod shifts;
pub mod stations;
pub mod users;

pub use assignments::Assignments;
pub use controller_families::ControllerFamilies;
pub use efficiency::Efficiency;
pub use jobs::Jobs;
pub use lines::Lines;
pub use repository::Repository;
pub use shifts::Shifts;
pub use stations::Stations;
pub use users::Users;
