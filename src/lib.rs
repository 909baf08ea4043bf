//! skein - in-process task schedulers
//!
//! Three thread pools sharing one task and result model:
//!
//! - [`SharedPool`]: every worker serves one FIFO queue behind one lock.
//! - [`StealingPool`]: one cache-aligned queue per worker, round-robin
//!   submission, non-blocking stealing between workers.
//! - [`PriorityPool`]: the same layout with `High`/`Normal`/`Low` lanes in
//!   every queue and strict precedence on the owner's side.
//!
//! # Quick Start
//!
//! ```no_run
//! use skein::prelude::*;
//!
//! let pool = StealingPool::with_threads(4).unwrap();
//!
//! let handle = pool.submit(|| 2 + 3).unwrap();
//! assert_eq!(handle.get(), 5);
//!
//! let urgent = PriorityPool::with_threads(2).unwrap();
//! let handle = urgent.submit_with_priority(|| "now", Priority::High).unwrap();
//! assert_eq!(handle.join().unwrap(), "now");
//! ```
//!
//! A panic inside a task never unwinds on the worker: it is stored in the
//! task's [`TaskHandle`] and re-raised by [`TaskHandle::get`] (or returned
//! as [`Error::TaskPanicked`] by [`TaskHandle::join`]).
//!
//! Shutdown is the only lifecycle call. It is idempotent, runs on drop,
//! rejects later submissions with [`Error::PoolStopped`], and waits for
//! every task accepted before it.

// Lint configuration
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod scheduler;
pub mod util;

#[cfg(feature = "async")]
pub mod async_bridge;

// Re-export key types at crate root
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use executor::{
    Executor, Job, PoolStats, PriorityPool, SharedPool, StealingPool, TaskHandle, TaskId,
    TaskPanic,
};
pub use scheduler::Priority;
