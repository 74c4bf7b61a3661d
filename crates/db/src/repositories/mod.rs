//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod group_repo;
pub mod group_role_repo;
pub mod task_queue_repo;

pub use group_repo::GroupRepo;
pub use group_role_repo::GroupRoleRepo;
pub use task_queue_repo::TaskQueueRepo;
