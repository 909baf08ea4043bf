//! Work-stealing pool with one cache-aligned FIFO queue per worker.

use super::handle::{bind, TaskHandle};
use super::task::{Job, Task};
use super::worker::{PoolStats, StealingCore};
use super::Executor;
use crate::config::Config;
use crate::error::Result;
use crate::scheduler::{Priority, StealOrder};
use std::collections::VecDeque;

/// Each worker owns a queue; submissions are spread round-robin.
///
/// A worker pops the front of its own queue. When that is empty it walks
/// the other queues in index order and takes the front task of the first
/// one whose lock it can grab without waiting. With nothing found anywhere
/// it sleeps for at most the configured idle timeout.
#[derive(Debug)]
pub struct StealingPool {
    core: StealingCore<VecDeque<Task>>,
}

impl StealingPool {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            core: StealingCore::new(config, StealOrder::Sequential)?,
        })
    }

    pub fn with_threads(num_threads: usize) -> Result<Self> {
        Self::new(&Config::builder().num_threads(num_threads).build()?)
    }

    /// Queue `f` and return a handle to its result.
    ///
    /// Fails with [`Error::PoolStopped`](crate::Error::PoolStopped) once
    /// shutdown has begun.
    pub fn submit<F, T>(&self, f: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (task, handle) = bind(f, Priority::Normal);
        self.core.push(task)?;
        Ok(handle)
    }

    pub fn num_threads(&self) -> usize {
        self.core.num_threads()
    }

    pub fn pending_tasks(&self) -> usize {
        self.core.pending_tasks()
    }

    pub fn stats(&self) -> PoolStats {
        self.core.stats()
    }

    pub fn is_shutdown(&self) -> bool {
        self.core.is_shutdown()
    }

    /// Stop accepting work, let every worker drain its queue, and join them.
    pub fn shutdown(&self) {
        self.core.shutdown();
    }
}

impl Executor for StealingPool {
    fn execute(&self, job: Job) -> Result<()> {
        self.core.push(Task::from_job(job, Priority::Normal))
    }

    fn num_threads(&self) -> usize {
        self.core.num_threads()
    }

    fn shutdown(&self) {
        self.core.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::util::CACHE_LINE_SIZE;
    use crossbeam_channel::bounded;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_submit_and_get() {
        let pool = StealingPool::with_threads(4).unwrap();
        let handles: Vec<_> = (0..100).map(|i| pool.submit(move || i * 2).unwrap()).collect();
        let total: i32 = handles.into_iter().map(|h| h.get()).sum();
        assert_eq!(total, 9900);
    }

    #[test]
    fn test_single_worker_is_fifo() {
        let pool = StealingPool::with_threads(1).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = ['a', 'b', 'c']
            .into_iter()
            .map(|name| {
                let order = order.clone();
                pool.submit(move || order.lock().push(name)).unwrap()
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*order.lock(), vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_idle_worker_steals_from_blocked_peer() {
        let pool = StealingPool::with_threads(2).unwrap();
        let (release_tx, release_rx) = bounded::<()>(0);
        let (started_tx, started_rx) = bounded::<()>(1);

        // lands in queue 0 and occupies whichever worker picks it up
        let blocker = pool
            .submit(move || {
                started_tx.send(()).unwrap();
                release_rx.recv().unwrap();
            })
            .unwrap();
        started_rx.recv().unwrap();

        // one of these sits behind the blocker's queue and must be stolen
        let a = pool.submit(|| 1).unwrap();
        let b = pool.submit(|| 2).unwrap();
        assert_eq!(a.join_timeout(Duration::from_secs(5)).unwrap().unwrap(), 1);
        assert_eq!(b.join_timeout(Duration::from_secs(5)).unwrap().unwrap(), 2);
        assert!(pool.stats().tasks_stolen >= 1);

        release_tx.send(()).unwrap();
        blocker.join().unwrap();
    }

    #[test]
    fn test_queues_are_cache_line_isolated() {
        let pool = StealingPool::with_threads(4).unwrap();
        let queues = &pool.core.shared().queues;
        let size = std::mem::size_of_val(&queues[0]);

        let mut starts: Vec<usize> = queues.iter().map(|q| q as *const _ as usize).collect();
        starts.sort_unstable();
        assert!(starts.iter().all(|addr| addr % CACHE_LINE_SIZE == 0));
        assert!(starts.windows(2).all(|w| w[0] + size <= w[1]));
    }

    #[test]
    fn test_submit_after_shutdown_is_rejected() {
        let pool = StealingPool::with_threads(2).unwrap();
        pool.shutdown();

        assert!(pool.is_shutdown());
        assert!(matches!(pool.submit(|| ()), Err(Error::PoolStopped)));
    }

    #[test]
    fn test_shutdown_drains_every_queue() {
        let pool = StealingPool::with_threads(3).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..60)
            .map(|_| {
                let counter = counter.clone();
                pool.submit(move || {
                    std::thread::sleep(Duration::from_millis(1));
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap()
            })
            .collect();

        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 60);
        assert_eq!(pool.pending_tasks(), 0);
        assert!(handles.into_iter().all(|h| h.join().is_ok()));

        let stats = pool.stats();
        assert_eq!(stats.tasks_submitted, 60);
        assert_eq!(stats.tasks_executed, 60);
    }

    #[test]
    fn test_panicking_job_is_isolated() {
        let pool = StealingPool::with_threads(1).unwrap();
        pool.execute(Box::new(|| panic!("fire and forget"))).unwrap();

        assert_eq!(pool.submit(|| 7).unwrap().get(), 7);
        assert_eq!(pool.stats().tasks_panicked, 1);
    }
}
