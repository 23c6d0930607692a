//! Common test utilities shared across integration tests.

use pacer::testing::CountingJob;
use pacer::SchedulerHandle;
use std::time::Duration;

/// Wait for a job to reach at least `at_least` completed runs.
///
/// Polling is more reliable than fixed sleeps since execution time can vary.
/// Polls every 10ms and panics after the timeout.
pub async fn wait_for_runs(job: &CountingJob, at_least: u32, timeout: Duration) {
    let start = tokio::time::Instant::now();
    loop {
        if job.count() >= at_least {
            return;
        }
        if start.elapsed() > timeout {
            panic!(
                "Timeout waiting for {} runs, got {}",
                at_least,
                job.count()
            );
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Wait for the scheduler's task count to reach `expected`.
pub async fn wait_for_task_count(handle: &SchedulerHandle, expected: usize, timeout: Duration) {
    let start = tokio::time::Instant::now();
    loop {
        let count = handle.task_count().await.unwrap();
        if count == expected {
            return;
        }
        if start.elapsed() > timeout {
            panic!(
                "Timeout waiting for task count {}, current count: {}",
                expected, count
            );
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
