//! Service seams between handlers and persistence.
//!
//! Handlers only talk to these traits through [`AppState`](crate::state::AppState),
//! so tests can swap in in-memory implementations.

pub mod group;
pub mod managed;

pub use group::{GroupService, PgGroupService};
pub use managed::{ConfigManagedInstanceChecker, ManagedInstanceChecker};
