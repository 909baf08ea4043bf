//! Task execution infrastructure.
//!
//! This module provides the worker threads, the result handles, and the
//! three pool flavours built on top of them.

pub mod handle;
pub mod panic_handler;
pub mod priority_pool;
pub mod shared_pool;
pub mod stealing_pool;
pub mod task;
pub mod worker;

pub use handle::TaskHandle;
pub use panic_handler::{PanicHandler, PanicStrategy, TaskPanic};
pub use priority_pool::PriorityPool;
pub use shared_pool::SharedPool;
pub use stealing_pool::StealingPool;
pub use task::{Job, TaskId};
pub use worker::PoolStats;

pub(crate) use task::Task;

use crate::error::Result;
use std::sync::Arc;

/// Anything that can run a fire-and-forget job on its own threads.
///
/// All pools implement this; it is also the only contract the
/// continuation bridge relies on.
pub trait Executor: Send + Sync {
    /// Queue `job` for execution. A panic inside `job` is contained by the
    /// worker that runs it.
    fn execute(&self, job: Job) -> Result<()>;

    fn num_threads(&self) -> usize;

    /// Stop accepting jobs, finish queued ones, and join the workers.
    fn shutdown(&self);
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, job: Job) -> Result<()> {
        (**self).execute(job)
    }

    fn num_threads(&self) -> usize {
        (**self).num_threads()
    }

    fn shutdown(&self) {
        (**self).shutdown()
    }
}
