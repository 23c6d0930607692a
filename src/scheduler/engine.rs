//! EDF scheduler engine.
//!
//! The scheduler owns the task pool and implements Earliest-Deadline-First
//! selection across it: every interval group is kept sorted by deadline, so
//! the globally earliest deadline is always among the per-group heads and
//! selection is O(number of groups) instead of O(number of tasks).
//!
//! The engine can be driven directly (`add_job` / `select_next` / `run_next`)
//! or started as a loop via [`Scheduler::start`], which returns a
//! [`SchedulerHandle`] for control over a command channel. All pool mutation
//! happens on the scheduling task; execution backends report completion only
//! through the awaited invocation future.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::clock::{Clock, SystemClock};
use crate::core::pool::TaskPool;
use crate::core::task::{Job, Task, TaskStats};
use crate::core::types::TaskId;
use crate::events::{Event, EventBus};
use crate::execution::{InlineRunner, Invocation, JobRunner};

use super::handle::{SchedulerHandle, COMMAND_CHANNEL_BUFFER};
use super::types::{ExecutionReport, SchedulerCommand, SchedulerError, SchedulerState};

/// Earliest-Deadline-First scheduler.
pub struct Scheduler {
    /// All scheduled tasks, grouped by interval.
    pool: TaskPool,
    /// Source of "now" for deadline arithmetic.
    clock: Arc<dyn Clock>,
    /// Execution backend.
    runner: Arc<dyn JobRunner>,
    /// Event bus for lifecycle events.
    event_bus: Arc<EventBus>,
    /// Monotonic registration counter, tie-break within a group.
    next_seq: u64,
    /// Task currently executing, if any.
    running: Option<TaskId>,
    /// Set when the running task was removed mid-execution; applied at the
    /// re-scheduling point.
    cancel_running: bool,
}

impl Scheduler {
    /// Create an empty scheduler with the system clock and the inline runner.
    pub fn new() -> Self {
        Self {
            pool: TaskPool::new(),
            clock: Arc::new(SystemClock),
            runner: Arc::new(InlineRunner),
            event_bus: Arc::new(EventBus::new()),
            next_seq: 0,
            running: None,
            cancel_running: false,
        }
    }

    /// Set the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the execution backend.
    pub fn with_runner(mut self, runner: Arc<dyn JobRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Set the event bus.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Arc::new(event_bus);
        self
    }

    /// Get the event bus.
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Number of scheduled tasks, including one mid-execution.
    pub fn task_count(&self) -> usize {
        self.pool.len() + usize::from(self.running.is_some())
    }

    /// Register a job to run every `interval`, starting `interval` from now.
    ///
    /// The returned handle identifies this registration; registering the same
    /// job body twice yields two independent tasks.
    pub async fn add_job(
        &mut self,
        job: Arc<dyn Job>,
        interval: Duration,
        one_shot: bool,
    ) -> Result<TaskId, SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval(interval));
        }

        let id = TaskId::new();
        let seq = self.next_seq;
        self.next_seq += 1;

        let task = Task::new(id, Arc::clone(&job), interval, one_shot, self.clock.now(), seq);
        debug!(task_id = %id, job = job.name(), interval = ?interval, one_shot, "task scheduled");
        self.pool.insert(task);

        self.event_bus
            .emit(Event::task_scheduled(id, job.name(), interval, one_shot))
            .await;

        Ok(id)
    }

    /// Remove a task by handle.
    ///
    /// With `interval` given, only that group is searched (fast path);
    /// without it, all groups are scanned. Removing the task currently
    /// executing marks it instead: the in-flight run is not interrupted, and
    /// the task is dropped at the re-scheduling point.
    pub async fn remove_task(
        &mut self,
        id: TaskId,
        interval: Option<Duration>,
    ) -> Result<(), SchedulerError> {
        if self.running == Some(id) {
            debug!(task_id = %id, "task is executing, marked for removal");
            self.cancel_running = true;
            return Ok(());
        }

        let removed = match interval {
            Some(interval) => self.pool.remove(interval, id),
            None => self.pool.remove_anywhere(id),
        };

        match removed {
            Some(task) => {
                debug!(task_id = %id, job = task.name(), "task removed");
                self.event_bus
                    .emit(Event::task_removed(id, task.name()))
                    .await;
                Ok(())
            }
            None => Err(SchedulerError::TaskNotFound(id)),
        }
    }

    /// Select the task with the globally earliest deadline.
    ///
    /// Only each group's head is inspected; within a group tasks are sorted
    /// by `(deadline, registration order)`, so the global minimum must be
    /// among the heads. Exact deadline ties across groups go to the smaller
    /// interval; within a group the earlier-registered task wins.
    pub fn select_next(&self) -> Result<&Task, SchedulerError> {
        self.pool
            .iter()
            .filter_map(|(interval, group)| group.first().map(|task| (task, interval)))
            .min_by_key(|(task, interval)| (task.deadline(), *interval))
            .map(|(task, _)| task)
            .ok_or(SchedulerError::NoScheduledTask)
    }

    /// Pop the task `select_next` would return.
    fn take_next(&mut self) -> Option<Task> {
        let interval = self
            .pool
            .iter()
            .filter_map(|(interval, group)| group.first().map(|task| (task.deadline(), interval)))
            .min()
            .map(|(_, interval)| interval)?;
        self.pool.pop_front(interval)
    }

    /// Select, execute, and re-schedule (or remove) the next task.
    ///
    /// A failure inside the job body is captured in the report and the task's
    /// own record; it never propagates out of the scheduler. Periodic tasks
    /// are re-scheduled after failures too; one-shot tasks are removed either
    /// way.
    pub async fn run_next(&mut self) -> Result<ExecutionReport, SchedulerError> {
        let task = self.take_next().ok_or(SchedulerError::NoScheduledTask)?;
        self.begin_run(&task).await;
        let invocation = self.runner.invoke(task.job()).await;
        Ok(self.complete(task, invocation).await)
    }

    /// Snapshot of every scheduled task's execution statistics.
    pub fn stats(&self) -> Vec<TaskStats> {
        self.pool
            .iter()
            .flat_map(|(_, group)| group.iter().map(Task::stats))
            .collect()
    }

    /// Start the scheduler loop and return a handle for controlling it.
    pub fn start(self) -> (SchedulerHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_BUFFER);
        let state = Arc::new(RwLock::new(SchedulerState::Running));

        let handle = SchedulerHandle {
            command_tx,
            state: Arc::clone(&state),
        };

        let scheduler_task = tokio::spawn(async move {
            self.run(command_rx, state).await;
        });

        (handle, scheduler_task)
    }

    /// Main scheduler loop: sleep until the earliest deadline, run the due
    /// task, and service commands in between (and during) executions. An
    /// empty pool means idle, waiting on commands.
    async fn run(
        mut self,
        mut command_rx: mpsc::Receiver<SchedulerCommand>,
        state: Arc<RwLock<SchedulerState>>,
    ) {
        info!("scheduler loop started");
        let mut shutdown_response = None;

        enum Wakeup {
            Due,
            Command(Option<SchedulerCommand>),
        }

        loop {
            let next_deadline = self.select_next().ok().map(Task::deadline);

            // Decide why we woke before touching the engine, so the command
            // channel is free to be borrowed again below.
            let wakeup = match next_deadline {
                None => Wakeup::Command(command_rx.recv().await),
                Some(deadline) => tokio::select! {
                    _ = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => {
                        Wakeup::Due
                    }
                    maybe_command = command_rx.recv() => Wakeup::Command(maybe_command),
                },
            };

            let pending_shutdown = match wakeup {
                Wakeup::Due => self.run_due(&mut command_rx).await,
                Wakeup::Command(Some(command)) => self.handle_command(command).await,
                Wakeup::Command(None) => break,
            };

            if let Some(response) = pending_shutdown {
                shutdown_response = Some(response);
                break;
            }
        }

        *state.write().await = SchedulerState::Stopped;
        if let Some(response) = shutdown_response {
            let _ = response.send(());
        }
        info!("scheduler loop stopped");
    }

    /// Run the due task while continuing to service commands.
    ///
    /// Returns the shutdown responder if a shutdown arrived mid-run; the run
    /// is always driven to completion first.
    async fn run_due(
        &mut self,
        command_rx: &mut mpsc::Receiver<SchedulerCommand>,
    ) -> Option<oneshot::Sender<()>> {
        let Some(task) = self.take_next() else {
            return None;
        };
        self.begin_run(&task).await;

        // The invocation future owns its runner and job clones, so commands
        // mutating `self` can be handled while it is in flight.
        let runner = Arc::clone(&self.runner);
        let job = task.job();
        let invoke = async move { runner.invoke(job).await };
        tokio::pin!(invoke);

        let mut shutdown_response = None;
        let mut commands_open = true;
        let invocation = loop {
            if commands_open {
                tokio::select! {
                    invocation = &mut invoke => break invocation,
                    maybe_command = command_rx.recv() => match maybe_command {
                        Some(command) => {
                            if let Some(response) = self.handle_command(command).await {
                                shutdown_response = Some(response);
                            }
                        }
                        None => commands_open = false,
                    },
                }
            } else {
                break (&mut invoke).await;
            }
        };

        self.complete(task, invocation).await;
        shutdown_response
    }

    /// Apply one command. Returns the responder when the command was a
    /// shutdown request, so the caller decides when to honor it.
    async fn handle_command(
        &mut self,
        command: SchedulerCommand,
    ) -> Option<oneshot::Sender<()>> {
        match command {
            SchedulerCommand::AddJob {
                job,
                interval,
                one_shot,
                response,
            } => {
                let _ = response.send(self.add_job(job, interval, one_shot).await);
                None
            }
            SchedulerCommand::RemoveTask {
                id,
                interval,
                response,
            } => {
                let _ = response.send(self.remove_task(id, interval).await);
                None
            }
            SchedulerCommand::TaskCount { response } => {
                let _ = response.send(self.task_count());
                None
            }
            SchedulerCommand::Stats { response } => {
                let _ = response.send(self.stats());
                None
            }
            SchedulerCommand::Shutdown { response } => Some(response),
        }
    }

    /// Mark the task as running and announce it.
    async fn begin_run(&mut self, task: &Task) {
        self.running = Some(task.id());
        self.cancel_running = false;
        info!(task_id = %task.id(), job = task.name(), "running task");
        self.event_bus
            .emit(Event::task_started(task.id(), task.name()))
            .await;
    }

    /// Record the invocation's outcome and apply the re-scheduling policy:
    /// one-shot or removal-marked tasks leave the pool; periodic tasks get
    /// `deadline = now + interval` and are re-inserted in order.
    async fn complete(&mut self, mut task: Task, invocation: Invocation) -> ExecutionReport {
        let now = self.clock.now();
        let error = invocation.error();
        task.record_run(now, invocation.duration, error.clone());

        match &invocation.result {
            Ok(()) => {
                debug!(
                    task_id = %task.id(),
                    job = task.name(),
                    duration = ?invocation.duration,
                    "task completed"
                );
                self.event_bus
                    .emit(Event::task_completed(
                        task.id(),
                        task.name(),
                        invocation.duration,
                    ))
                    .await;
            }
            Err(job_error) => {
                warn!(
                    task_id = %task.id(),
                    job = task.name(),
                    error = %job_error,
                    "job failed, scheduler continues"
                );
                self.event_bus
                    .emit(Event::task_failed(
                        task.id(),
                        task.name(),
                        job_error.to_string(),
                        invocation.duration,
                    ))
                    .await;
            }
        }

        let cancelled = self.cancel_running;
        self.running = None;
        self.cancel_running = false;

        let removed = task.one_shot() || cancelled;
        let report = ExecutionReport {
            task_id: task.id(),
            job: task.name().to_string(),
            duration: invocation.duration,
            removed,
            error,
        };

        if removed {
            debug!(
                task_id = %task.id(),
                job = task.name(),
                one_shot = task.one_shot(),
                "task left the pool after execution"
            );
            self.event_bus
                .emit(Event::task_removed(task.id(), task.name()))
                .await;
        } else {
            task.reschedule(now);
            self.pool.insert(task);
        }

        report
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
