//! Scheduler type definitions.
//!
//! This module contains error types, state enums, and command types for the
//! scheduler.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::core::task::{Job, TaskStats};
use crate::core::types::TaskId;

/// Errors that can occur in the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Registration with a non-positive interval.
    #[error("interval must be positive, got {0:?}")]
    InvalidInterval(Duration),

    /// Removal of a handle not present in any group.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// Selection attempted on an empty scheduler. Callers should treat this
    /// as "idle", not as a failure.
    #[error("no scheduled task")]
    NoScheduledTask,

    /// Channel error.
    #[error("channel error: {0}")]
    Channel(String),
}

/// State of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Scheduler is running.
    Running,
    /// Scheduler is stopped.
    Stopped,
}

/// Report of one `run_next` execution.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// The task that ran.
    pub task_id: TaskId,
    /// The job's name.
    pub job: String,
    /// Measured duration of the job body.
    pub duration: Duration,
    /// Whether the task left the pool (one-shot, or removed while running).
    pub removed: bool,
    /// Error from the job body, if it failed.
    pub error: Option<String>,
}

/// Commands that can be sent to the scheduler loop.
pub(crate) enum SchedulerCommand {
    /// Register a job.
    AddJob {
        job: Arc<dyn Job>,
        interval: Duration,
        one_shot: bool,
        response: oneshot::Sender<Result<TaskId, SchedulerError>>,
    },
    /// Remove a task by handle.
    RemoveTask {
        id: TaskId,
        interval: Option<Duration>,
        response: oneshot::Sender<Result<(), SchedulerError>>,
    },
    /// Count currently scheduled tasks (including one mid-execution).
    TaskCount { response: oneshot::Sender<usize> },
    /// Snapshot per-task execution statistics.
    Stats {
        response: oneshot::Sender<Vec<TaskStats>>,
    },
    /// Shut down the loop after the current execution, if any.
    Shutdown { response: oneshot::Sender<()> },
}
