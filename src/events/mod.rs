//! Task lifecycle events and event handling.
//!
//! Registration, execution, failure, and removal are emitted as events so
//! callers can observe the scheduler without reaching into its pool. This is
//! also the asynchronous surfacing channel for job-body failures: a failed run
//! produces a `TaskFailed` event rather than an error from the loop.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::core::types::TaskId;

/// Lifecycle events emitted by the scheduler.
#[derive(Debug, Clone)]
pub enum Event {
    /// A task was registered with the scheduler.
    TaskScheduled {
        task_id: TaskId,
        job: String,
        interval: Duration,
        one_shot: bool,
        timestamp: Instant,
    },

    /// A task's execution has started.
    TaskStarted {
        task_id: TaskId,
        job: String,
        timestamp: Instant,
    },

    /// A task's execution completed successfully.
    TaskCompleted {
        task_id: TaskId,
        job: String,
        duration: Duration,
        timestamp: Instant,
    },

    /// A task's execution failed. Periodic tasks are still re-scheduled
    /// after a failure.
    TaskFailed {
        task_id: TaskId,
        job: String,
        error: String,
        duration: Duration,
        timestamp: Instant,
    },

    /// A task left the pool for good: cancelled, or a one-shot that ran.
    TaskRemoved {
        task_id: TaskId,
        job: String,
        timestamp: Instant,
    },
}

impl Event {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> Instant {
        match self {
            Event::TaskScheduled { timestamp, .. } => *timestamp,
            Event::TaskStarted { timestamp, .. } => *timestamp,
            Event::TaskCompleted { timestamp, .. } => *timestamp,
            Event::TaskFailed { timestamp, .. } => *timestamp,
            Event::TaskRemoved { timestamp, .. } => *timestamp,
        }
    }

    /// The task this event concerns.
    pub fn task_id(&self) -> TaskId {
        match self {
            Event::TaskScheduled { task_id, .. } => *task_id,
            Event::TaskStarted { task_id, .. } => *task_id,
            Event::TaskCompleted { task_id, .. } => *task_id,
            Event::TaskFailed { task_id, .. } => *task_id,
            Event::TaskRemoved { task_id, .. } => *task_id,
        }
    }

    /// Create a TaskScheduled event.
    pub fn task_scheduled(
        task_id: TaskId,
        job: impl Into<String>,
        interval: Duration,
        one_shot: bool,
    ) -> Self {
        Event::TaskScheduled {
            task_id,
            job: job.into(),
            interval,
            one_shot,
            timestamp: Instant::now(),
        }
    }

    /// Create a TaskStarted event.
    pub fn task_started(task_id: TaskId, job: impl Into<String>) -> Self {
        Event::TaskStarted {
            task_id,
            job: job.into(),
            timestamp: Instant::now(),
        }
    }

    /// Create a TaskCompleted event.
    pub fn task_completed(task_id: TaskId, job: impl Into<String>, duration: Duration) -> Self {
        Event::TaskCompleted {
            task_id,
            job: job.into(),
            duration,
            timestamp: Instant::now(),
        }
    }

    /// Create a TaskFailed event.
    pub fn task_failed(
        task_id: TaskId,
        job: impl Into<String>,
        error: String,
        duration: Duration,
    ) -> Self {
        Event::TaskFailed {
            task_id,
            job: job.into(),
            error,
            duration,
            timestamp: Instant::now(),
        }
    }

    /// Create a TaskRemoved event.
    pub fn task_removed(task_id: TaskId, job: impl Into<String>) -> Self {
        Event::TaskRemoved {
            task_id,
            job: job.into(),
            timestamp: Instant::now(),
        }
    }
}

/// Handler for receiving lifecycle events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an event.
    async fn handle(&self, event: &Event);
}

/// Event bus for distributing events to registered handlers.
pub struct EventBus {
    handlers: RwLock<Vec<Arc<dyn EventHandler>>>,
}

impl EventBus {
    /// Create a new event bus with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Register an event handler.
    pub async fn register(&self, handler: Arc<dyn EventHandler>) {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);
    }

    /// Emit an event to all registered handlers.
    pub async fn emit(&self, event: Event) {
        let handlers = self.handlers.read().await;
        for handler in handlers.iter() {
            handler.handle(&event).await;
        }
    }

    /// Get the number of registered handlers.
    pub async fn handler_count(&self) -> usize {
        self.handlers.read().await.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
