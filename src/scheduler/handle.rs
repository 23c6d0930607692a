//! Scheduler handle for controlling a running scheduler.
//!
//! This module provides the `SchedulerHandle` type that allows external
//! control of the scheduler loop: registering and removing tasks, inspecting
//! counts and statistics, and shutting down.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, RwLock};

use crate::core::task::{Job, TaskStats};
use crate::core::types::TaskId;

use super::types::{SchedulerCommand, SchedulerError, SchedulerState};

/// Buffer size for the command channel between SchedulerHandle and the loop.
pub(crate) const COMMAND_CHANNEL_BUFFER: usize = 32;

/// Handle for controlling the scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    pub(crate) command_tx: mpsc::Sender<SchedulerCommand>,
    pub(crate) state: Arc<RwLock<SchedulerState>>,
}

impl SchedulerHandle {
    /// Helper to send a command that returns a result and wait for response.
    async fn send_result_command<T>(
        &self,
        build_command: impl FnOnce(oneshot::Sender<Result<T, SchedulerError>>) -> SchedulerCommand,
        operation: &str,
    ) -> Result<T, SchedulerError>
    where
        T: Send + 'static,
    {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(build_command(response_tx))
            .await
            .map_err(|_| {
                SchedulerError::Channel(format!("failed to send {} command", operation))
            })?;

        response_rx.await.map_err(|_| {
            SchedulerError::Channel(format!("failed to receive {} response", operation))
        })?
    }

    /// Helper to send a command that returns a plain value and wait for it.
    async fn send_query<T>(
        &self,
        build_command: impl FnOnce(oneshot::Sender<T>) -> SchedulerCommand,
        operation: &str,
    ) -> Result<T, SchedulerError>
    where
        T: Send + 'static,
    {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(build_command(response_tx))
            .await
            .map_err(|_| {
                SchedulerError::Channel(format!("failed to send {} command", operation))
            })?;

        response_rx.await.map_err(|_| {
            SchedulerError::Channel(format!("failed to receive {} response", operation))
        })
    }

    /// Register a job with the running scheduler.
    pub async fn add_job(
        &self,
        job: Arc<dyn Job>,
        interval: Duration,
        one_shot: bool,
    ) -> Result<TaskId, SchedulerError> {
        self.send_result_command(
            |response| SchedulerCommand::AddJob {
                job,
                interval,
                one_shot,
                response,
            },
            "add_job",
        )
        .await
    }

    /// Remove a task by handle. Passing the task's interval removes directly
    /// from that group; without it, all groups are scanned.
    ///
    /// Removing the task currently executing succeeds immediately; the
    /// removal takes effect when the in-flight run completes.
    pub async fn remove_task(
        &self,
        id: TaskId,
        interval: Option<Duration>,
    ) -> Result<(), SchedulerError> {
        self.send_result_command(
            |response| SchedulerCommand::RemoveTask {
                id,
                interval,
                response,
            },
            "remove_task",
        )
        .await
    }

    /// Number of currently scheduled tasks, including one mid-execution.
    pub async fn task_count(&self) -> Result<usize, SchedulerError> {
        self.send_query(
            |response| SchedulerCommand::TaskCount { response },
            "task_count",
        )
        .await
    }

    /// Snapshot per-task execution statistics.
    pub async fn stats(&self) -> Result<Vec<TaskStats>, SchedulerError> {
        self.send_query(|response| SchedulerCommand::Stats { response }, "stats")
            .await
    }

    /// Shut down the scheduler.
    ///
    /// The loop halts after the current execution, if one is in flight; the
    /// in-flight run is never cancelled.
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(SchedulerCommand::Shutdown {
                response: response_tx,
            })
            .await
            .map_err(|_| SchedulerError::Channel("failed to send shutdown command".to_string()))?;

        response_rx
            .await
            .map_err(|_| SchedulerError::Channel("failed to receive shutdown response".to_string()))
    }

    /// Get the current scheduler state.
    pub async fn state(&self) -> SchedulerState {
        *self.state.read().await
    }

    /// Check if the scheduler is running.
    pub async fn is_running(&self) -> bool {
        *self.state.read().await == SchedulerState::Running
    }
}
