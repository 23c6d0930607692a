//! Job trait, task record, and error types.
//!
//! A [`Job`] is the opaque unit of work handed to the scheduler; a [`Task`]
//! is the scheduler's record of one registration of a job, carrying its
//! timing state. The same job body registered twice yields two independent
//! tasks.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use super::types::TaskId;

/// Errors that can occur inside a job body.
#[derive(Debug, Error)]
pub enum JobError {
    /// Job execution failed with a message.
    #[error("execution failed: {0}")]
    Failed(String),

    /// Job body panicked (only observable with a spawning runner).
    #[error("job panicked: {0}")]
    Panicked(String),

    /// Generic error wrapper.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// The core trait for defining schedulable work.
///
/// # Example
///
/// ```ignore
/// use pacer::{Job, JobError};
/// use async_trait::async_trait;
///
/// struct Heartbeat;
///
/// #[async_trait]
/// impl Job for Heartbeat {
///     fn name(&self) -> &str {
///         "heartbeat"
///     }
///
///     async fn run(&self) -> Result<(), JobError> {
///         tracing::info!("still alive");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Job: Send + Sync {
    /// Returns the name of this job, used for logging and events.
    fn name(&self) -> &str;

    /// Execute the job once.
    async fn run(&self) -> Result<(), JobError>;
}

/// One scheduled unit of work plus its timing state.
///
/// Mutated only by the scheduler. Immediately after (re)scheduling,
/// `deadline == now + interval` for the clock reading taken at that point.
#[derive(Clone)]
pub struct Task {
    id: TaskId,
    job: Arc<dyn Job>,
    interval: Duration,
    one_shot: bool,
    last_ran: Option<Instant>,
    deadline: Instant,
    execution_times: Vec<Duration>,
    last_error: Option<String>,
    /// Registration order, used as the deterministic tie-break within a
    /// deadline-equal group.
    seq: u64,
}

impl Task {
    /// Create a task with `deadline = now + interval`.
    pub(crate) fn new(
        id: TaskId,
        job: Arc<dyn Job>,
        interval: Duration,
        one_shot: bool,
        now: Instant,
        seq: u64,
    ) -> Self {
        Self {
            id,
            job,
            interval,
            one_shot,
            last_ran: None,
            deadline: now + interval,
            execution_times: Vec::new(),
            last_error: None,
            seq,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The job body, shared with whatever runner executes it.
    pub fn job(&self) -> Arc<dyn Job> {
        Arc::clone(&self.job)
    }

    pub fn name(&self) -> &str {
        self.job.name()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn one_shot(&self) -> bool {
        self.one_shot
    }

    pub fn last_ran(&self) -> Option<Instant> {
        self.last_ran
    }

    /// Absolute instant of the next required execution.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Observed run durations, append-only, oldest first.
    pub fn execution_times(&self) -> &[Duration] {
        &self.execution_times
    }

    /// Error message from the most recent run, if it failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    /// Record the outcome of one execution.
    pub(crate) fn record_run(&mut self, now: Instant, duration: Duration, error: Option<String>) {
        self.last_ran = Some(now);
        self.execution_times.push(duration);
        self.last_error = error;
    }

    /// Re-base the deadline from `now`. Never called for one-shot tasks.
    pub(crate) fn reschedule(&mut self, now: Instant) {
        debug_assert!(!self.one_shot);
        self.deadline = now + self.interval;
    }

    /// Snapshot of this task's diagnostics.
    pub fn stats(&self) -> TaskStats {
        let runs = self.execution_times.len();
        let total: Duration = self.execution_times.iter().sum();
        TaskStats {
            task_id: self.id,
            job: self.job.name().to_string(),
            interval: self.interval,
            one_shot: self.one_shot,
            runs,
            total,
            mean: (runs > 0).then(|| total / runs as u32),
            last: self.execution_times.last().copied(),
            last_error: self.last_error.clone(),
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("job", &self.job.name())
            .field("interval", &self.interval)
            .field("one_shot", &self.one_shot)
            .field("deadline", &self.deadline)
            .field("runs", &self.execution_times.len())
            .finish()
    }
}

/// Serializable summary of a task's observed executions.
#[derive(Debug, Clone, Serialize)]
pub struct TaskStats {
    pub task_id: TaskId,
    pub job: String,
    pub interval: Duration,
    pub one_shot: bool,
    pub runs: usize,
    pub total: Duration,
    pub mean: Option<Duration>,
    pub last: Option<Duration>,
    pub last_error: Option<String>,
}
