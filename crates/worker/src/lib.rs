//! Compute-engine worker: claims tasks from the `ce_queue` table and routes
//! them to the registered processors.

pub mod config;
pub mod processors;
pub mod queue;
