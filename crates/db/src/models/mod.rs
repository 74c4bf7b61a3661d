//! Database row types and their DTOs.

pub mod group;
pub mod group_role;
pub mod task_queue;
