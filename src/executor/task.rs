//! Task representation and execution.

use crate::scheduler::Priority;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A type-erased task body.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Internal task representation
pub(crate) struct Task {
    pub(crate) id: TaskId,
    pub(crate) func: Job,
    pub(crate) priority: Priority,
}

impl Task {
    #[cfg(test)]
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::with_priority(f, Priority::Normal)
    }

    #[cfg(test)]
    pub(crate) fn with_priority<F>(f: F, priority: Priority) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::from_job(Box::new(f), priority)
    }

    pub(crate) fn from_job(func: Job, priority: Priority) -> Self {
        Self::from_parts(TaskId::next(), func, priority)
    }

    pub(crate) fn from_parts(id: TaskId, func: Job, priority: Priority) -> Self {
        Task { id, func, priority }
    }

    /// Execute the task
    pub fn execute(self) {
        (self.func)();
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}
