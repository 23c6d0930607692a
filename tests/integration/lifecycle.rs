//! Task lifecycle: one-shot removal, failure containment, events.

use pacer::testing::{CountingJob, FailingJob, ManualClock, RecordingHandler};
use pacer::{Event, EventBus, PooledRunner, Scheduler};
use std::sync::Arc;
use std::time::Duration;

use crate::common::{wait_for_runs, wait_for_task_count};

#[tokio::test]
async fn test_one_shot_runs_exactly_once() {
    let mut scheduler = Scheduler::new();
    let once = CountingJob::new("once");
    let periodic = CountingJob::new("periodic");

    scheduler
        .add_job(once.clone(), Duration::from_millis(20), true)
        .await
        .unwrap();
    scheduler
        .add_job(periodic.clone(), Duration::from_millis(30), false)
        .await
        .unwrap();

    let (handle, task) = scheduler.start();

    // The one-shot leaves the pool after its single run.
    wait_for_task_count(&handle, 1, Duration::from_secs(2)).await;
    wait_for_runs(&periodic, 4, Duration::from_secs(2)).await;

    handle.shutdown().await.unwrap();
    let _ = task.await;

    assert_eq!(once.count(), 1);
}

#[tokio::test]
async fn test_one_shot_event_sequence() {
    let event_bus = EventBus::new();
    let handler = RecordingHandler::new();
    event_bus.register(handler.clone()).await;

    let clock = Arc::new(ManualClock::new());
    let mut scheduler = Scheduler::new()
        .with_clock(clock.clone())
        .with_event_bus(event_bus);

    let id = scheduler
        .add_job(CountingJob::new("once"), Duration::from_secs(1), true)
        .await
        .unwrap();

    clock.advance(Duration::from_secs(1));
    scheduler.run_next().await.unwrap();

    let events = handler.events().await;
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], Event::TaskScheduled { .. }));
    assert!(matches!(events[1], Event::TaskStarted { .. }));
    assert!(matches!(events[2], Event::TaskCompleted { .. }));
    assert!(matches!(events[3], Event::TaskRemoved { .. }));
    assert!(events.iter().all(|e| e.task_id() == id));
}

#[tokio::test]
async fn test_failing_job_does_not_stop_the_loop() {
    let event_bus = EventBus::new();
    let handler = RecordingHandler::new();
    event_bus.register(handler.clone()).await;

    let mut scheduler = Scheduler::new().with_event_bus(event_bus);
    let healthy = CountingJob::new("healthy");

    scheduler
        .add_job(
            FailingJob::new("flaky", "db down"),
            Duration::from_millis(20),
            false,
        )
        .await
        .unwrap();
    scheduler
        .add_job(healthy.clone(), Duration::from_millis(30), false)
        .await
        .unwrap();

    let (handle, task) = scheduler.start();

    // Healthy work keeps running alongside the repeatedly-failing task.
    wait_for_runs(&healthy, 4, Duration::from_secs(2)).await;

    let stats = handle.stats().await.unwrap();
    handle.shutdown().await.unwrap();
    let _ = task.await;

    let flaky = stats.iter().find(|s| s.job == "flaky").unwrap();
    assert!(flaky.runs >= 1);
    assert!(flaky.last_error.as_deref().unwrap().contains("db down"));

    let events = handler.events().await;
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::TaskFailed { error, .. } if error.contains("db down"))));
}

#[tokio::test]
async fn test_panicking_job_is_contained_by_pooled_runner() {
    use async_trait::async_trait;
    use pacer::{Job, JobError};

    struct PanickingJob;

    #[async_trait]
    impl Job for PanickingJob {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn run(&self) -> Result<(), JobError> {
            panic!("boom");
        }
    }

    let mut scheduler = Scheduler::new().with_runner(Arc::new(PooledRunner::new(2)));
    let healthy = CountingJob::new("healthy");

    scheduler
        .add_job(Arc::new(PanickingJob), Duration::from_millis(20), false)
        .await
        .unwrap();
    scheduler
        .add_job(healthy.clone(), Duration::from_millis(30), false)
        .await
        .unwrap();

    let (handle, task) = scheduler.start();

    wait_for_runs(&healthy, 3, Duration::from_secs(2)).await;

    let stats = handle.stats().await.unwrap();
    handle.shutdown().await.unwrap();
    let _ = task.await;

    let panicking = stats.iter().find(|s| s.job == "panicking").unwrap();
    assert!(panicking
        .last_error
        .as_deref()
        .unwrap()
        .contains("panicked"));
}
