//! Core data model: identifiers, jobs, the task record, the clock
//! abstraction, and the task pool.

pub mod clock;
pub mod pool;
pub mod task;
pub mod types;
