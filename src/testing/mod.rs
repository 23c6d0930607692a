//! Testing utilities for users of the pacer library.
//!
//! This module provides helpers for testing scheduling behavior:
//!
//! - [`ManualClock`]: a [`Clock`] advanced explicitly, for exact deadline
//!   arithmetic in tests
//! - [`CountingJob`]: a job that counts its executions
//! - [`FailingJob`]: a job that always fails with a fixed message
//! - [`RecordingHandler`]: an [`EventHandler`] that records every event

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::core::clock::Clock;
use crate::core::task::{Job, JobError};
use crate::events::{Event, EventHandler};

/// A clock that only moves when told to.
///
/// ```
/// use pacer::testing::ManualClock;
/// use pacer::Clock;
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let t0 = clock.now();
/// clock.advance(Duration::from_secs(5));
/// assert_eq!(clock.now(), t0 + Duration::from_secs(5));
/// ```
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Create a clock frozen at an arbitrary base instant.
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut offset = self.offset.lock().expect("clock lock poisoned");
        *offset += duration;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().expect("clock lock poisoned")
    }
}

/// A job that succeeds and counts how many times it ran.
pub struct CountingJob {
    name: String,
    count: AtomicU32,
}

impl CountingJob {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            count: AtomicU32::new(0),
        })
    }

    /// Number of completed executions.
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Job for CountingJob {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), JobError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A job that always fails with the given message.
pub struct FailingJob {
    name: String,
    message: String,
}

impl FailingJob {
    pub fn new(name: &str, message: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            message: message.to_string(),
        })
    }
}

#[async_trait]
impl Job for FailingJob {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), JobError> {
        Err(JobError::Failed(self.message.clone()))
    }
}

/// Event handler that records every event it receives.
pub struct RecordingHandler {
    events: tokio::sync::Mutex<Vec<Event>>,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: tokio::sync::Mutex::new(Vec::new()),
        })
    }

    /// Snapshot of all recorded events, in arrival order.
    pub async fn events(&self) -> Vec<Event> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: &Event) {
        self.events.lock().await.push(event.clone());
    }
}
