//! Compute-engine task routing.
//!
//! [`TaskProcessor`]s declare the task types they handle. At startup
//! [`TaskRouter::build`] checks that no type is claimed twice and freezes
//! the type -> processor map. [`TaskRouter::dispatch`] routes a [`Task`] and
//! always returns a [`DispatchOutcome`]: processor errors and panics are
//! caught and reported, never propagated. [`TaskWorker`] drives a
//! [`TaskSource`] through the router until cancelled.

pub mod channel;
pub mod error;
pub mod processor;
pub mod router;
pub mod task;
pub mod worker;

pub use channel::{ChannelTaskSource, TaskSubmitter};
pub use error::{EngineError, ProcessingFailed};
pub use processor::TaskProcessor;
pub use router::{DispatchOutcome, TaskRouter, UnhandledTaskPolicy};
pub use task::{Task, TaskResult};
pub use worker::{BoxError, TaskSource, TaskWorker, WorkerStats};
