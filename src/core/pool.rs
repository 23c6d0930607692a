//! The task pool: tasks grouped by interval, each group deadline-ordered.
//!
//! The pool is exclusively owned and mutated by the scheduler. Lookups for
//! unknown intervals yield an empty slice and never create an entry, so reads
//! are side-effect-free. Every mutation restores the per-group sort invariant
//! (ascending by deadline, registration order breaking ties), which is what
//! makes head-only selection in the scheduler valid.

use std::collections::BTreeMap;
use std::time::Duration;

use super::task::Task;
use super::types::TaskId;

/// Tasks keyed by interval, each group sorted ascending by
/// `(deadline, registration order)`.
///
/// Groups are dropped as soon as they become empty, so iteration only ever
/// visits non-empty groups.
#[derive(Debug, Default)]
pub struct TaskPool {
    groups: BTreeMap<Duration, Vec<Task>>,
}

impl TaskPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The group for `interval`, or an empty slice if none exists.
    ///
    /// Pure read: never creates an entry for the key.
    pub fn get_or_empty(&self, interval: Duration) -> &[Task] {
        self.groups.get(&interval).map(Vec::as_slice).unwrap_or(&[])
    }

    /// File a task into its interval's group, keeping the group sorted.
    pub fn insert(&mut self, task: Task) {
        let group = self.groups.entry(task.interval()).or_default();
        group.push(task);
        group.sort_by_key(|t| (t.deadline(), t.seq()));
        debug_assert!(Self::is_sorted(group));
    }

    /// Remove the head (earliest-deadline) task of `interval`'s group.
    pub fn pop_front(&mut self, interval: Duration) -> Option<Task> {
        let group = self.groups.get_mut(&interval)?;
        let task = group.remove(0);
        if group.is_empty() {
            self.groups.remove(&interval);
        }
        Some(task)
    }

    /// Remove a specific task from `interval`'s group.
    ///
    /// Returns `None` when the task is not in that group; absence is not an
    /// error here, the scheduler decides whether to report it.
    pub fn remove(&mut self, interval: Duration, id: TaskId) -> Option<Task> {
        let group = self.groups.get_mut(&interval)?;
        let position = group.iter().position(|t| t.id() == id)?;
        let task = group.remove(position);
        debug_assert!(Self::is_sorted(group));
        if group.is_empty() {
            self.groups.remove(&interval);
        }
        Some(task)
    }

    /// Remove a task without knowing its interval, scanning all groups.
    ///
    /// O(total tasks); the interval-keyed [`TaskPool::remove`] is the fast
    /// path.
    pub fn remove_anywhere(&mut self, id: TaskId) -> Option<Task> {
        let interval = self
            .groups
            .iter()
            .find(|(_, group)| group.iter().any(|t| t.id() == id))
            .map(|(interval, _)| *interval)?;
        self.remove(interval, id)
    }

    /// Iterate over all (interval, group) pairs, ascending by interval.
    pub fn iter(&self) -> impl Iterator<Item = (Duration, &[Task])> {
        self.groups
            .iter()
            .map(|(interval, group)| (*interval, group.as_slice()))
    }

    /// Total number of tasks across all groups.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn is_sorted(group: &[Task]) -> bool {
        group
            .windows(2)
            .all(|w| (w[0].deadline(), w[0].seq()) <= (w[1].deadline(), w[1].seq()))
    }
}
