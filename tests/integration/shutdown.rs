//! Graceful shutdown behavior.

use async_trait::async_trait;
use pacer::testing::CountingJob;
use pacer::{Job, JobError, Scheduler, SchedulerError, SchedulerState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Job that sleeps, then flips a flag so tests can verify it ran to
/// completion.
struct SlowJob {
    finished: Arc<AtomicBool>,
}

#[async_trait]
impl Job for SlowJob {
    fn name(&self) -> &str {
        "slow"
    }

    async fn run(&self) -> Result<(), JobError> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_shutdown_idle_scheduler() {
    let scheduler = Scheduler::new();
    let (handle, task) = scheduler.start();

    assert!(handle.is_running().await);
    handle.shutdown().await.unwrap();
    let _ = task.await;

    assert_eq!(handle.state().await, SchedulerState::Stopped);
}

#[tokio::test]
async fn test_commands_fail_after_shutdown() {
    let scheduler = Scheduler::new();
    let (handle, task) = scheduler.start();

    handle.shutdown().await.unwrap();
    let _ = task.await;

    let result = handle
        .add_job(CountingJob::new("late"), Duration::from_secs(1), false)
        .await;
    assert!(matches!(result, Err(SchedulerError::Channel(_))));
}

#[tokio::test]
async fn test_shutdown_does_not_cancel_inflight_run() {
    let finished = Arc::new(AtomicBool::new(false));
    let mut scheduler = Scheduler::new();
    scheduler
        .add_job(
            Arc::new(SlowJob {
                finished: Arc::clone(&finished),
            }),
            Duration::from_millis(10),
            true,
        )
        .await
        .unwrap();

    let (handle, task) = scheduler.start();

    // Let the slow job start, then ask for shutdown mid-run.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!finished.load(Ordering::SeqCst));
    handle.shutdown().await.unwrap();
    let _ = task.await;

    // The run was driven to completion before the loop stopped.
    assert!(finished.load(Ordering::SeqCst));
    assert_eq!(handle.state().await, SchedulerState::Stopped);
}

#[tokio::test]
async fn test_remove_running_task_then_shutdown() {
    let finished = Arc::new(AtomicBool::new(false));
    let mut scheduler = Scheduler::new();
    let id = scheduler
        .add_job(
            Arc::new(SlowJob {
                finished: Arc::clone(&finished),
            }),
            Duration::from_millis(10),
            false,
        )
        .await
        .unwrap();

    let (handle, task) = scheduler.start();

    // Remove the task while it is executing: accepted immediately, applied
    // when the run completes.
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.remove_task(id, None).await.unwrap();

    crate::common::wait_for_task_count(&handle, 0, Duration::from_secs(2)).await;
    assert!(finished.load(Ordering::SeqCst));

    handle.shutdown().await.unwrap();
    let _ = task.await;
}
