// worker threads and the loop they run
use super::panic_handler::PanicHandler;
use super::task::Task;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::scheduler::{StealOrder, TaskLanes, WorkQueue};
use crate::util::CachePadded;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

pub type WorkerId = usize;

#[cfg(target_os = "linux")]
fn pin_thread_to_core(core_id: usize) {
    let core_id = core_id % num_cpus::get();
    let result = unsafe {
        let mut cpuset: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(core_id, &mut cpuset);
        libc::sched_setaffinity(
            0, // current thread
            std::mem::size_of::<libc::cpu_set_t>(),
            &cpuset,
        )
    };
    if result != 0 {
        warn!(
            thread = thread::current().name().unwrap_or("unknown"),
            core_id, "failed to pin worker thread"
        );
    }
}

pub(crate) fn spawn_worker<F>(config: &Config, id: WorkerId, body: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let name = format!("{}-{}", config.thread_name_prefix, id);
    let mut builder = thread::Builder::new().name(name);

    if let Some(stack_size) = config.stack_size {
        builder = builder.stack_size(stack_size);
    }

    let pin_workers = config.pin_workers;
    builder
        .spawn(move || {
            #[cfg(target_os = "linux")]
            if pin_workers {
                pin_thread_to_core(id);
            }
            #[cfg(not(target_os = "linux"))]
            let _ = pin_workers;

            debug!(worker = id, "worker started");
            body();
            debug!(worker = id, "worker exiting");
        })
        .map_err(|e| Error::executor(format!("spawn failed: {}", e)))
}

/// Join handles of a pool's workers.
///
/// One caller at a time joins. Other callers that are not workers of this
/// pool wait until that join is over and then join whatever is left, so
/// every external `shutdown` returns only after all workers have exited. A
/// worker never joins itself and never waits, because the thread doing the
/// join may be waiting for that very worker.
#[derive(Debug, Default)]
pub(crate) struct WorkerThreads {
    state: Mutex<ThreadsState>,
    joined: Condvar,
}

#[derive(Debug, Default)]
struct ThreadsState {
    handles: Vec<JoinHandle<()>>,
    ids: Vec<ThreadId>,
    joining: bool,
}

impl WorkerThreads {
    pub(crate) fn push(&self, handle: JoinHandle<()>) {
        let mut state = self.state.lock();
        state.ids.push(handle.thread().id());
        state.handles.push(handle);
    }

    pub(crate) fn join_all(&self) {
        let current = thread::current().id();
        let mut state = self.state.lock();
        let is_worker = state.ids.contains(&current);

        while state.joining {
            if is_worker {
                return;
            }
            self.joined.wait(&mut state);
        }

        // a worker leaves its own handle for the next external caller
        let (own, others): (Vec<_>, Vec<_>) = std::mem::take(&mut state.handles)
            .into_iter()
            .partition(|handle| handle.thread().id() == current);
        state.handles = own;
        if others.is_empty() {
            return;
        }
        state.joining = true;
        drop(state);

        for handle in others {
            if handle.join().is_err() {
                warn!("worker thread panicked outside of a task");
            }
        }

        self.state.lock().joining = false;
        self.joined.notify_all();
    }
}

/// Counters shared by every worker of a pool.
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    submitted: CachePadded<AtomicU64>,
    executed: CachePadded<AtomicU64>,
    stolen: CachePadded<AtomicU64>,
}

impl PoolCounters {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_executed(&self) {
        self.executed.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn record_stolen(&self) {
        self.stolen.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads `executed` before `submitted`: every counted execution was
    /// counted as submitted first, so `tasks_executed <= tasks_submitted`.
    pub(crate) fn snapshot(&self, panic_handler: &PanicHandler) -> PoolStats {
        let tasks_executed = self.executed.load(Ordering::Acquire);
        PoolStats {
            tasks_submitted: self.submitted.load(Ordering::Relaxed),
            tasks_executed,
            tasks_stolen: self.stolen.load(Ordering::Relaxed),
            tasks_panicked: panic_handler.panic_count() as u64,
        }
    }
}

/// Point-in-time view of a pool's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub tasks_submitted: u64,
    pub tasks_executed: u64,
    /// Tasks taken from another worker's queue.
    pub tasks_stolen: u64,
    /// Panics that reached the worker. Panics in tasks with a
    /// [`TaskHandle`](super::TaskHandle) are delivered to the handle and
    /// not counted here.
    pub tasks_panicked: u64,
}

/// Run a task on the current worker, keeping the worker alive if it panics.
pub(crate) fn run_task(
    task: Task,
    worker: WorkerId,
    panic_handler: &PanicHandler,
    counters: &PoolCounters,
) {
    let id = task.id;
    if let Err(panic) = panic_handler.execute(|| task.execute()) {
        warn!(worker, task = ?id, message = %panic.message(), "task panicked");
    }
    counters.record_executed();
}

/// Sleep/wake coordination for idle workers. Carries no task data.
#[derive(Debug, Default)]
pub(crate) struct IdleGate {
    lock: Mutex<()>,
    wake: Condvar,
}

impl IdleGate {
    /// Sleep for at most `timeout`, unless `stop` is already set.
    ///
    /// `stop` is checked after taking the gate lock and before waiting; the
    /// timeout covers a submission whose notification raced ahead of us.
    pub(crate) fn sleep(&self, stop: &AtomicBool, timeout: Duration) {
        let mut guard = self.lock.lock();
        if stop.load(Ordering::Acquire) {
            return;
        }
        self.wake.wait_for(&mut guard, timeout);
    }

    pub(crate) fn notify_one(&self) {
        self.wake.notify_one();
    }

    pub(crate) fn notify_all(&self) {
        let _guard = self.lock.lock();
        self.wake.notify_all();
    }
}

/// State shared by the workers of a queue-per-worker pool.
#[derive(Debug)]
pub(crate) struct Shared<L> {
    pub(crate) queues: Vec<WorkQueue<L>>,
    stop: AtomicBool,
    idle: IdleGate,
    next_queue: CachePadded<AtomicUsize>,
    steal_order: StealOrder,
    idle_timeout: Duration,
    pub(crate) counters: PoolCounters,
    pub(crate) panic_handler: PanicHandler,
}

impl<L: TaskLanes> Shared<L> {
    fn new(num_queues: usize, steal_order: StealOrder, idle_timeout: Duration) -> Self {
        Self {
            queues: (0..num_queues).map(|_| WorkQueue::new()).collect(),
            stop: AtomicBool::new(false),
            idle: IdleGate::default(),
            next_queue: CachePadded::new(AtomicUsize::new(0)),
            steal_order,
            idle_timeout,
            counters: PoolCounters::default(),
            panic_handler: PanicHandler::default(),
        }
    }

    /// Round-robin the task onto a queue and wake one sleeper.
    ///
    /// The stop flag is read under the destination lock. A worker only
    /// exits after it saw the flag and then found its own queue empty under
    /// that same lock, so an accepted task always has a live owner.
    pub(crate) fn push(&self, task: Task) -> Result<()> {
        let index = self.next_queue.fetch_add(1, Ordering::Relaxed) % self.queues.len();
        {
            let mut lanes = self.queues[index].lock();
            if self.stop.load(Ordering::Acquire) {
                return Err(Error::PoolStopped);
            }
            lanes.push(task);
            self.counters.record_submitted();
        }
        self.idle.notify_one();
        Ok(())
    }
}

impl<L> Shared<L> {
    pub(crate) fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Returns `true` for the call that actually flipped the flag.
    fn request_stop(&self) -> bool {
        let first = !self.stop.swap(true, Ordering::AcqRel);
        self.idle.notify_all();
        first
    }
}

pub(crate) struct Worker<L> {
    pub id: WorkerId,
    shared: Arc<Shared<L>>,
}

impl<L: TaskLanes> Worker<L> {
    pub(crate) fn new(id: WorkerId, shared: Arc<Shared<L>>) -> Self {
        Self { id, shared }
    }

    // main loop
    pub(crate) fn run(&self) {
        loop {
            // read before looking for work: an empty scan after seeing the
            // flag means our own queue can no longer receive tasks
            let stopping = self.shared.stop.load(Ordering::Acquire);

            if let Some(task) = self.find_task() {
                run_task(task, self.id, &self.shared.panic_handler, &self.shared.counters);
                continue;
            }

            if stopping {
                break;
            }

            self.shared
                .idle
                .sleep(&self.shared.stop, self.shared.idle_timeout);
        }
    }

    fn find_task(&self) -> Option<Task> {
        // 1. own queue first (best cache locality)
        let local = self.shared.queues[self.id].pop();
        if local.is_some() {
            return local;
        }

        // 2. steal from other workers
        self.try_steal()
    }

    fn try_steal(&self) -> Option<Task> {
        let queues = &self.shared.queues;
        let n = queues.len();
        if n <= 1 {
            return None;
        }

        let start = self.shared.steal_order.start(n);
        for offset in 0..n {
            let victim = (start + offset) % n;
            if victim == self.id {
                continue;
            }

            // a busy victim is skipped, never waited on
            let Some(mut lanes) = queues[victim].try_lock() else {
                continue;
            };
            if let Some(task) = lanes.steal() {
                drop(lanes);
                self.shared.counters.record_stolen();
                trace!(worker = self.id, victim, task = ?task.id, "stole task");
                return Some(task);
            }
        }

        None
    }
}

/// Worker threads plus the queues they serve. Both stealing pools are thin
/// wrappers around this.
#[derive(Debug)]
pub(crate) struct StealingCore<L> {
    shared: Arc<Shared<L>>,
    threads: WorkerThreads,
    num_threads: usize,
}

impl<L: TaskLanes> StealingCore<L> {
    pub(crate) fn new(config: &Config, steal_order: StealOrder) -> Result<Self> {
        config.validate()?;
        let num_threads = config.worker_threads();
        if num_threads == 0 {
            return Err(Error::config("need at least 1 thread"));
        }

        let shared = Arc::new(Shared::new(num_threads, steal_order, config.idle_timeout));
        let core = Self {
            shared: shared.clone(),
            threads: WorkerThreads::default(),
            num_threads,
        };

        for id in 0..num_threads {
            let worker = Worker::new(id, shared.clone());
            // on error `core` drops here and joins what was already spawned
            let handle = spawn_worker(config, id, move || worker.run())?;
            core.threads.push(handle);
        }

        info!(threads = num_threads, ?steal_order, "pool started");
        Ok(core)
    }

    pub(crate) fn push(&self, task: Task) -> Result<()> {
        self.shared.push(task)
    }

    /// Tasks queued on any worker and not yet picked up.
    pub(crate) fn pending_tasks(&self) -> usize {
        self.shared.queues.iter().map(WorkQueue::len).sum()
    }
}

impl<L> StealingCore<L> {
    #[cfg(test)]
    pub(crate) fn shared(&self) -> &Shared<L> {
        &self.shared
    }

    pub(crate) fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub(crate) fn stats(&self) -> PoolStats {
        self.shared.counters.snapshot(&self.shared.panic_handler)
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.shared.is_stopped()
    }

    /// Stop accepting work, let the workers drain their queues, and join them.
    pub(crate) fn shutdown(&self) {
        if self.shared.request_stop() {
            info!(threads = self.num_threads, "pool shutting down");
        }
        self.threads.join_all();
    }
}

impl<L> Drop for StealingCore<L> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
