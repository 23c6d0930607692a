//! Earliest-Deadline-First scheduling engine.
//!
//! This module provides the EDF core (selection and re-scheduling over the
//! task pool) and the loop/handle pair for driving it.

mod engine;
mod handle;
mod types;

pub use engine::Scheduler;
pub use handle::SchedulerHandle;
pub use types::{ExecutionReport, SchedulerError, SchedulerState};
