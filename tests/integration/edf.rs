//! EDF selection order, end to end.

use pacer::testing::{CountingJob, ManualClock};
use pacer::{Clock, Scheduler};
use std::sync::Arc;
use std::time::Duration;

use crate::common::wait_for_runs;

const SEC: Duration = Duration::from_secs(1);

#[tokio::test]
async fn test_execution_order_is_deterministic_under_manual_clock() {
    let clock = Arc::new(ManualClock::new());
    let mut scheduler = Scheduler::new().with_clock(clock.clone());

    // a every 1s, b every 2s, registered at the same instant. EDF with
    // deadline-then-interval tie-break gives: a, (a b), a, (a b).
    scheduler
        .add_job(CountingJob::new("a"), SEC, false)
        .await
        .unwrap();
    scheduler
        .add_job(CountingJob::new("b"), 2 * SEC, false)
        .await
        .unwrap();

    let mut order = Vec::new();
    for _ in 0..4 {
        clock.advance(SEC);
        while scheduler
            .select_next()
            .map(|task| task.deadline() <= clock.now())
            .unwrap_or(false)
        {
            let report = scheduler.run_next().await.unwrap();
            order.push(report.job);
        }
    }

    assert_eq!(order, ["a", "a", "b", "a", "a", "b"]);
}

#[tokio::test]
async fn test_faster_interval_runs_more_often_in_real_time() {
    let mut scheduler = Scheduler::new();
    let fast = CountingJob::new("fast");
    let slow = CountingJob::new("slow");

    scheduler
        .add_job(fast.clone(), Duration::from_millis(30), false)
        .await
        .unwrap();
    scheduler
        .add_job(slow.clone(), Duration::from_millis(100), false)
        .await
        .unwrap();

    let (handle, task) = scheduler.start();

    wait_for_runs(&fast, 6, Duration::from_secs(2)).await;
    wait_for_runs(&slow, 1, Duration::from_secs(2)).await;

    handle.shutdown().await.unwrap();
    let _ = task.await;

    assert!(
        fast.count() > slow.count(),
        "fast ran {} times, slow {} times",
        fast.count(),
        slow.count()
    );
}

#[tokio::test]
async fn test_selection_matches_reference_edf_simulation() {
    let clock = Arc::new(ManualClock::new());
    let mut scheduler = Scheduler::new().with_clock(clock.clone());

    let intervals = [7u64, 3, 9, 2, 5];
    for interval in intervals {
        scheduler
            .add_job(
                CountingJob::new(&format!("every_{}s", interval)),
                SEC * interval as u32,
                false,
            )
            .await
            .unwrap();
    }

    // Reference model: (deadline, interval) pairs, the minimum is always
    // chosen and re-based to now + interval after running.
    let mut model: Vec<(u64, u64)> = intervals.iter().map(|&i| (i, i)).collect();

    for step in 1..=30u64 {
        clock.advance(SEC);
        let report = scheduler.run_next().await.unwrap();

        let (chosen_index, _) = model
            .iter()
            .enumerate()
            .min_by_key(|(_, &(deadline, interval))| (deadline, interval))
            .unwrap();
        let expected_interval = model[chosen_index].1;
        model[chosen_index].0 = step + expected_interval;

        assert_eq!(
            report.job,
            format!("every_{}s", expected_interval),
            "wrong task at step {}",
            step
        );
    }
}
