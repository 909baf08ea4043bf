//! One-shot result delivery from a worker back to the submitter.
//!
//! [`bind`] turns a closure into a [`Task`] plus the [`TaskHandle`] that
//! will observe its outcome. The task side owns the only sender, so the
//! handle learns about a task that was dropped without running as soon as
//! the sender goes away.

use super::panic_handler::TaskPanic;
use super::task::{Task, TaskId};
use crate::error::{Error, Result};
use crate::scheduler::Priority;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

type Outcome<T> = std::thread::Result<T>;

/// Producer side of a task's result.
pub(crate) struct Promise<T> {
    tx: Sender<Outcome<T>>,
}

impl<T> Promise<T> {
    pub(crate) fn fulfill(self, outcome: Outcome<T>) {
        // the handle may already be gone; nobody is waiting then
        let _ = self.tx.send(outcome);
    }
}

/// Wrap `f` as a task whose return value or panic lands in the returned
/// handle.
pub(crate) fn bind<F, T>(f: F, priority: Priority) -> (Task, TaskHandle<T>)
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let id = TaskId::next();
    let (tx, rx) = bounded(1);
    let promise = Promise { tx };

    let job = Box::new(move || {
        promise.fulfill(catch_unwind(AssertUnwindSafe(f)));
    });

    (Task::from_parts(id, job, priority), TaskHandle { id, rx })
}

/// Handle to the eventual result of a submitted task.
///
/// The result is written exactly once by whichever worker runs the task.
/// A panic inside the task is not raised on the worker; it is stored and
/// surfaces here instead.
pub struct TaskHandle<T> {
    id: TaskId,
    rx: Receiver<Outcome<T>>,
}

impl<T> TaskHandle<T> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Returns `true` once the value or the panic is available.
    pub fn is_finished(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Block until the task finishes.
    ///
    /// Returns [`Error::TaskPanicked`] if the task body panicked and
    /// [`Error::Abandoned`] if the task was dropped without running.
    pub fn join(self) -> Result<T> {
        match self.rx.recv() {
            Ok(outcome) => settle(outcome),
            Err(_) => Err(Error::Abandoned),
        }
    }

    /// Block until the task finishes and return its value.
    ///
    /// # Panics
    ///
    /// Re-raises the task's panic with its original payload, or panics if
    /// the task was abandoned.
    pub fn get(self) -> T {
        let id = self.id;
        match self.join() {
            Ok(value) => value,
            Err(Error::TaskPanicked(panic)) => panic.resume(),
            Err(err) => panic!("task {:?} produced no result: {}", id, err),
        }
    }

    /// Non-blocking variant of [`join`](Self::join); gives the handle back
    /// if the task has not finished yet.
    pub fn try_join(self) -> std::result::Result<Result<T>, Self> {
        match self.rx.try_recv() {
            Ok(outcome) => Ok(settle(outcome)),
            Err(TryRecvError::Disconnected) => Ok(Err(Error::Abandoned)),
            Err(TryRecvError::Empty) => Err(self),
        }
    }

    /// Like [`join`](Self::join) but gives the handle back after `timeout`.
    pub fn join_timeout(self, timeout: Duration) -> std::result::Result<Result<T>, Self> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Ok(settle(outcome)),
            Err(RecvTimeoutError::Disconnected) => Ok(Err(Error::Abandoned)),
            Err(RecvTimeoutError::Timeout) => Err(self),
        }
    }
}

fn settle<T>(outcome: Outcome<T>) -> Result<T> {
    outcome.map_err(|payload| Error::TaskPanicked(TaskPanic::from_payload(payload)))
}

impl<T> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_round_trip() {
        let (task, handle) = bind(|| 2 + 3, Priority::Normal);
        assert!(!handle.is_finished());

        task.execute();
        assert!(handle.is_finished());
        assert_eq!(handle.get(), 5);
    }

    #[test]
    fn test_panic_is_deferred_to_join() {
        let (task, handle) = bind(|| -> u8 { panic!("boom") }, Priority::Normal);

        // running the task does not unwind into the executing thread
        task.execute();

        let panic = handle.join().unwrap_err().into_panic().unwrap();
        assert_eq!(panic.message(), "boom");
    }

    #[test]
    fn test_dropped_task_reports_abandoned() {
        let (task, handle) = bind(|| 1, Priority::Low);
        drop(task);

        assert!(matches!(handle.join(), Err(Error::Abandoned)));
    }

    #[test]
    fn test_try_join_returns_handle_until_done() {
        let (task, handle) = bind(|| "done", Priority::High);

        let handle = handle.try_join().unwrap_err();
        let handle = handle.join_timeout(Duration::from_millis(5)).unwrap_err();

        task.execute();
        assert_eq!(handle.try_join().unwrap().unwrap(), "done");
    }

    #[test]
    fn test_handle_id_matches_task() {
        let (task, handle) = bind(|| (), Priority::Normal);
        assert_eq!(task.id, handle.id());
        assert_eq!(task.priority, Priority::Normal);
    }
}
