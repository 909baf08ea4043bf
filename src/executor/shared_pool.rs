//! Baseline pool: every worker serves one shared FIFO queue.

use super::handle::{bind, TaskHandle};
use super::panic_handler::PanicHandler;
use super::task::{Job, Task};
use super::worker::{run_task, spawn_worker, PoolCounters, PoolStats, WorkerId, WorkerThreads};
use super::Executor;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::scheduler::Priority;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default)]
struct QueueState {
    tasks: VecDeque<Task>,
    stopping: bool,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<QueueState>,
    available: Condvar,
    counters: PoolCounters,
    panic_handler: PanicHandler,
}

impl Inner {
    fn worker_loop(&self, id: WorkerId) {
        loop {
            let task = {
                let mut state = self.state.lock();
                while state.tasks.is_empty() && !state.stopping {
                    self.available.wait(&mut state);
                }
                // empty here means stopping: the queue is drained
                match state.tasks.pop_front() {
                    Some(task) => task,
                    None => break,
                }
            };

            run_task(task, id, &self.panic_handler, &self.counters);
        }
    }
}

/// A fixed set of workers behind a single queue, lock and condition variable.
///
/// Simple and strictly FIFO, but every submission and every dequeue contends
/// on the same lock. Shutdown runs everything already queued before the
/// workers exit.
#[derive(Debug)]
pub struct SharedPool {
    inner: Arc<Inner>,
    threads: WorkerThreads,
    num_threads: usize,
}

impl SharedPool {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let num_threads = config.worker_threads();
        if num_threads == 0 {
            return Err(Error::config("need at least 1 thread"));
        }

        let inner = Arc::new(Inner::default());
        let pool = Self {
            inner: inner.clone(),
            threads: WorkerThreads::default(),
            num_threads,
        };

        for id in 0..num_threads {
            let inner = inner.clone();
            let handle = spawn_worker(config, id, move || inner.worker_loop(id))?;
            pool.threads.push(handle);
        }

        info!(threads = num_threads, "shared-queue pool started");
        Ok(pool)
    }

    pub fn with_threads(num_threads: usize) -> Result<Self> {
        Self::new(&Config::builder().num_threads(num_threads).build()?)
    }

    /// Queue `f` and return a handle to its result.
    ///
    /// Fails with [`Error::PoolStopped`] once shutdown has begun.
    pub fn submit<F, T>(&self, f: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (task, handle) = bind(f, Priority::Normal);
        self.push(task)?;
        Ok(handle)
    }

    fn push(&self, task: Task) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if state.stopping {
                return Err(Error::PoolStopped);
            }
            state.tasks.push_back(task);
            self.inner.counters.record_submitted();
        }
        self.inner.available.notify_one();
        Ok(())
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn pending_tasks(&self) -> usize {
        self.inner.state.lock().tasks.len()
    }

    pub fn stats(&self) -> PoolStats {
        self.inner.counters.snapshot(&self.inner.panic_handler)
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.state.lock().stopping
    }

    /// Stop accepting work, run what is queued, and join the workers.
    pub fn shutdown(&self) {
        let first = {
            let mut state = self.inner.state.lock();
            !std::mem::replace(&mut state.stopping, true)
        };
        if first {
            info!(threads = self.num_threads, "shared-queue pool shutting down");
        }

        // wake everyone up to check the flag
        self.inner.available.notify_all();

        self.threads.join_all();
    }
}

impl Executor for SharedPool {
    fn execute(&self, job: Job) -> Result<()> {
        self.push(Task::from_job(job, Priority::Normal))
    }

    fn num_threads(&self) -> usize {
        self.num_threads
    }

    fn shutdown(&self) {
        SharedPool::shutdown(self);
    }
}

impl Drop for SharedPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
