//! pacer - a minimal Earliest-Deadline-First task scheduler.
//!
//! Tasks are periodic units of work grouped by interval; the scheduler always
//! runs the task with the nearest absolute deadline, re-basing a periodic
//! task's deadline from "now" after each run and permanently removing
//! one-shot tasks after their single execution.
//!
//! ```ignore
//! use pacer::Scheduler;
//! use std::time::Duration;
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.add_job(my_job, Duration::from_secs(1), false).await?;
//! let (handle, _loop) = scheduler.start();
//! // ...
//! handle.shutdown().await?;
//! ```

pub mod core;
pub mod events;
pub mod execution;
pub mod scheduler;
pub mod testing;

pub use crate::core::clock::{Clock, SystemClock};
pub use crate::core::pool::TaskPool;
pub use crate::core::task::{Job, JobError, Task, TaskStats};
pub use crate::core::types::TaskId;
pub use crate::events::{Event, EventBus, EventHandler};
pub use crate::execution::{InlineRunner, Invocation, JobRunner, PooledRunner};
pub use crate::scheduler::{
    ExecutionReport, Scheduler, SchedulerError, SchedulerHandle, SchedulerState,
};
