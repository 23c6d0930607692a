//! Core identifier types for the scheduler.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique handle for a scheduled task.
///
/// Returned by `add_job` and used for later removal. Two tasks wrapping the
/// same job body under different registrations get distinct handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a new random TaskId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a TaskId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
