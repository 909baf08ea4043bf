//! Work-stealing pool with strict per-worker priority tiers.

use super::handle::{bind, TaskHandle};
use super::task::{Job, Task};
use super::worker::{PoolStats, StealingCore};
use super::Executor;
use crate::config::Config;
use crate::error::Result;
use crate::scheduler::{Priority, StealOrder, TieredLanes};

/// Like [`StealingPool`](super::StealingPool), but every queue keeps one
/// lane per [`Priority`] behind its single lock.
///
/// A worker always takes the oldest task of the highest non-empty tier in
/// its own queue. Thieves start at a random victim and take the newest task
/// of that victim's highest non-empty tier.
///
/// Precedence holds only within one worker's local decision: with
/// round-robin placement and stealing there is no pool-wide ordering, and
/// there is no aging, so a sustained stream of `High` tasks can starve
/// `Low` ones indefinitely.
#[derive(Debug)]
pub struct PriorityPool {
    core: StealingCore<TieredLanes>,
}

impl PriorityPool {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            core: StealingCore::new(config, StealOrder::RandomStart)?,
        })
    }

    pub fn with_threads(num_threads: usize) -> Result<Self> {
        Self::new(&Config::builder().num_threads(num_threads).build()?)
    }

    /// Submit at [`Priority::Normal`].
    pub fn submit<F, T>(&self, f: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.submit_with_priority(f, Priority::Normal)
    }

    pub fn submit_with_priority<F, T>(&self, f: F, priority: Priority) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (task, handle) = bind(f, priority);
        self.core.push(task)?;
        Ok(handle)
    }

    /// Fire-and-forget submission at an explicit tier.
    pub fn execute_with_priority(&self, job: Job, priority: Priority) -> Result<()> {
        self.core.push(Task::from_job(job, priority))
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

    pub fn shutdown(&self) {
        self.core.shutdown();
    }
}

impl Executor for PriorityPool {
    fn execute(&self, job: Job) -> Result<()> {
        self.execute_with_priority(job, Priority::Normal)
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
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_default_priority_submit() {
        let pool = PriorityPool::with_threads(2).unwrap();
        assert_eq!(pool.submit(|| "normal").unwrap().get(), "normal");
        assert_eq!(
            pool.submit_with_priority(|| 2 + 3, Priority::Low).unwrap().get(),
            5
        );
    }

    #[test]
    fn test_high_runs_before_low_behind_blocker() {
        let pool = PriorityPool::with_threads(1).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        let (release_tx, release_rx) = bounded::<()>(0);
        let (started_tx, started_rx) = bounded::<()>(1);

        let blocker = pool
            .submit(move || {
                started_tx.send(()).unwrap();
                release_rx.recv().unwrap();
            })
            .unwrap();
        started_rx.recv().unwrap();

        let plan = [
            (Priority::Low, "low-1"),
            (Priority::High, "high-1"),
            (Priority::Low, "low-2"),
            (Priority::High, "high-2"),
        ];
        let handles: Vec<_> = plan
            .into_iter()
            .map(|(priority, name)| {
                let order = order.clone();
                pool.submit_with_priority(move || order.lock().push(name), priority)
                    .unwrap()
            })
            .collect();
        assert_eq!(pool.pending_tasks(), 4);

        release_tx.send(()).unwrap();
        blocker.join().unwrap();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*order.lock(), vec!["high-1", "high-2", "low-1", "low-2"]);
    }

    #[test]
    fn test_thief_takes_from_blocked_peer() {
        let pool = PriorityPool::with_threads(2).unwrap();
        let (release_tx, release_rx) = bounded::<()>(0);
        let (started_tx, started_rx) = bounded::<()>(1);

        let blocker = pool
            .submit_with_priority(
                move || {
                    started_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                },
                Priority::High,
            )
            .unwrap();
        started_rx.recv().unwrap();

        let a = pool.submit_with_priority(|| 'a', Priority::Low).unwrap();
        let b = pool.submit_with_priority(|| 'b', Priority::High).unwrap();
        assert_eq!(a.join_timeout(Duration::from_secs(5)).unwrap().unwrap(), 'a');
        assert_eq!(b.join_timeout(Duration::from_secs(5)).unwrap().unwrap(), 'b');
        assert!(pool.stats().tasks_stolen >= 1);

        release_tx.send(()).unwrap();
        blocker.join().unwrap();
    }

    #[test]
    fn test_queues_are_cache_line_isolated() {
        let pool = PriorityPool::with_threads(3).unwrap();
        for queue in &pool.core.shared().queues {
            assert_eq!(queue as *const _ as usize % CACHE_LINE_SIZE, 0);
        }
    }

    #[test]
    fn test_submit_after_shutdown_is_rejected() {
        let pool = PriorityPool::with_threads(2).unwrap();
        pool.shutdown();

        assert!(matches!(
            pool.submit_with_priority(|| (), Priority::High),
            Err(Error::PoolStopped)
        ));
        assert!(pool
            .execute_with_priority(Box::new(|| ()), Priority::Low)
            .unwrap_err()
            .is_pool_stopped());
    }

    #[test]
    fn test_shutdown_drains_all_tiers() {
        let pool = PriorityPool::with_threads(2).unwrap();
        let handles: Vec<_> = (0..30)
            .map(|i| {
                let priority = Priority::ALL[i % Priority::COUNT];
                pool.submit_with_priority(move || i, priority).unwrap()
            })
            .collect();

        pool.shutdown();
        assert_eq!(pool.pending_tasks(), 0);
        let sum: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(sum, (0..30).sum());
    }
}
