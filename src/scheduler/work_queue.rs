use super::TaskLanes;
use crate::executor::Task;
use crate::util::CachePadded;
use parking_lot::{Mutex, MutexGuard};

/// A worker-owned task queue on its own cache line.
///
/// The mutex is the only thing guarding the lanes. Critical sections are
/// single push/pop operations; tasks never run while the lock is held.
#[derive(Debug, Default)]
pub(crate) struct WorkQueue<L> {
    lanes: CachePadded<Mutex<L>>,
}

impl<L: TaskLanes> WorkQueue<L> {
    pub fn new() -> Self {
        Self {
            lanes: CachePadded::new(Mutex::new(L::default())),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, L> {
        self.lanes.lock()
    }

    /// Returns `None` instead of waiting when another thread holds the lock.
    pub(crate) fn try_lock(&self) -> Option<MutexGuard<'_, L>> {
        self.lanes.try_lock()
    }

    pub(crate) fn pop(&self) -> Option<Task> {
        self.lock().pop()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }
}
