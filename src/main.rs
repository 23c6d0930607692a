//! pacer - a minimal Earliest-Deadline-First task scheduler.
//!
//! Demo harness: registers a couple of periodic jobs and a one-shot, drives
//! the scheduler for a while, then prints per-task execution statistics.

use async_trait::async_trait;
use clap::Parser;
use pacer::{
    EventBus, EventHandler, Job, JobError, PooledRunner, Scheduler, SchedulerHandle, TaskStats,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// pacer - a minimal Earliest-Deadline-First task scheduler
#[derive(Parser)]
#[command(name = "pacer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// How long to run the demo, in seconds
    #[arg(long, default_value = "6")]
    duration: u64,

    /// Dispatch job bodies onto a bounded worker pool of this size
    /// (default: run in-line on the scheduling task)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Print the final statistics as JSON
    #[arg(long)]
    json: bool,
}

/// Periodic job that logs the elapsed demo time.
struct UptimeJob {
    started: Instant,
}

#[async_trait]
impl Job for UptimeJob {
    fn name(&self) -> &str {
        "uptime"
    }

    async fn run(&self) -> Result<(), JobError> {
        info!("up for {:?}", self.started.elapsed());
        Ok(())
    }
}

/// Slower periodic job.
struct ReportJob;

#[async_trait]
impl Job for ReportJob {
    fn name(&self) -> &str {
        "report"
    }

    async fn run(&self) -> Result<(), JobError> {
        info!("nothing to report");
        Ok(())
    }
}

/// One-shot job.
struct GreetingJob;

#[async_trait]
impl Job for GreetingJob {
    fn name(&self) -> &str {
        "greeting"
    }

    async fn run(&self) -> Result<(), JobError> {
        info!("hello from the one-shot");
        Ok(())
    }
}

/// Simple logging event handler that prints task events.
struct LoggingHandler;

#[async_trait]
impl EventHandler for LoggingHandler {
    async fn handle(&self, event: &pacer::Event) {
        match event {
            pacer::Event::TaskScheduled {
                task_id,
                job,
                interval,
                one_shot,
                ..
            } => {
                info!(
                    "Task '{}' scheduled every {:?}{} ({})",
                    job,
                    interval,
                    if *one_shot { " (one-shot)" } else { "" },
                    task_id
                );
            }
            pacer::Event::TaskCompleted {
                job, duration, ..
            } => {
                info!("Task '{}' completed in {:?}", job, duration);
            }
            pacer::Event::TaskFailed { job, error, .. } => {
                error!("Task '{}' failed: {}", job, error);
            }
            pacer::Event::TaskRemoved { job, .. } => {
                info!("Task '{}' removed", job);
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let event_bus = EventBus::new();
    event_bus.register(Arc::new(LoggingHandler)).await;

    let mut scheduler = Scheduler::new().with_event_bus(event_bus);
    if let Some(workers) = cli.workers {
        scheduler = scheduler.with_runner(Arc::new(PooledRunner::new(workers)));
    }

    scheduler
        .add_job(
            Arc::new(UptimeJob {
                started: Instant::now(),
            }),
            Duration::from_secs(1),
            false,
        )
        .await?;
    scheduler
        .add_job(Arc::new(ReportJob), Duration::from_secs(2), false)
        .await?;
    scheduler
        .add_job(Arc::new(GreetingJob), Duration::from_secs(3), true)
        .await?;

    info!("Starting scheduler for {}s", cli.duration);
    let (handle, scheduler_task) = scheduler.start();

    tokio::time::sleep(Duration::from_secs(cli.duration)).await;

    let stats = handle.stats().await.unwrap_or_default();
    shutdown(&handle).await;
    let _ = scheduler_task.await;

    print_stats(&stats, cli.json)?;

    Ok(())
}

async fn shutdown(handle: &SchedulerHandle) {
    if let Err(e) = handle.shutdown().await {
        warn!("Shutdown failed: {}", e);
    }
}

fn print_stats(stats: &[TaskStats], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
        return Ok(());
    }

    println!("{:<12} {:>6} {:>12} {:>12}", "job", "runs", "mean", "last");
    for stat in stats {
        println!(
            "{:<12} {:>6} {:>12} {:>12}",
            stat.job,
            stat.runs,
            stat.mean
                .map(|d| format!("{:?}", d))
                .unwrap_or_else(|| "-".to_string()),
            stat.last.map(|d| format!("{:?}", d)).unwrap_or_else(|| "-".to_string()),
        );
        if let Some(error) = &stat.last_error {
            println!("  last error: {}", error);
        }
    }
    Ok(())
}
