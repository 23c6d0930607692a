//! Job execution backends.
//!
//! The scheduler depends only on the [`JobRunner`] capability: invoke a job
//! and obtain its result and measured duration. Selection and re-scheduling
//! never care how the job actually ran, so backends can be swapped without
//! touching the EDF core.
//!
//! Two backends are provided: [`InlineRunner`] runs the job on the scheduling
//! task itself (the default, simplest model), and [`PooledRunner`] dispatches
//! bodies onto spawned workers behind a bounded semaphore. In both cases the
//! scheduler suspends only at "await completion"; workers never touch the
//! task pool.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::core::task::{Job, JobError};

/// Outcome of invoking a job once: the result plus the measured duration of
/// the body itself.
#[derive(Debug)]
pub struct Invocation {
    pub duration: Duration,
    pub result: Result<(), JobError>,
}

impl Invocation {
    /// Error message, if the invocation failed.
    pub fn error(&self) -> Option<String> {
        self.result.as_ref().err().map(|e| e.to_string())
    }
}

/// Capability to invoke a job and obtain a result or failure.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Run the job once and report back.
    async fn invoke(&self, job: Arc<dyn Job>) -> Invocation;
}

/// Runs jobs in-line on the scheduling task.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineRunner;

#[async_trait]
impl JobRunner for InlineRunner {
    async fn invoke(&self, job: Arc<dyn Job>) -> Invocation {
        let start = Instant::now();
        let result = job.run().await;
        Invocation {
            duration: start.elapsed(),
            result,
        }
    }
}

/// Dispatches job bodies onto spawned workers, at most `max_concurrency` at a
/// time.
///
/// Completion comes back solely through the awaited join handle; a panicking
/// job body is contained and reported as [`JobError::Panicked`] instead of
/// tearing down the scheduler.
pub struct PooledRunner {
    max_concurrency: usize,
    semaphore: Arc<Semaphore>,
}

impl PooledRunner {
    /// Create a runner with the given concurrency limit.
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency,
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
        }
    }

    /// Get the maximum concurrency limit.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Get the number of available worker slots.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[async_trait]
impl JobRunner for PooledRunner {
    async fn invoke(&self, job: Arc<dyn Job>) -> Invocation {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("semaphore closed");

        let handle = tokio::spawn(async move {
            let start = Instant::now();
            let result = job.run().await;
            drop(permit);
            (start.elapsed(), result)
        });

        match handle.await {
            Ok((duration, result)) => Invocation { duration, result },
            Err(join_error) if join_error.is_panic() => Invocation {
                duration: Duration::ZERO,
                result: Err(JobError::Panicked(join_error.to_string())),
            },
            Err(join_error) => Invocation {
                duration: Duration::ZERO,
                result: Err(JobError::Failed(join_error.to_string())),
            },
        }
    }
}
