//! Rescheduling suspended computations onto a pool.
//!
//! A [`Continuation`] is the resumption point of a paused future. Awaiting
//! [`schedule_on`] captures it and submits "resume this" to an
//! [`Executor`](crate::executor::Executor) as an ordinary job; the pool has
//! no special path for it. [`Coroutine`] is a minimal driver whose waker
//! polls the future inline, so after such an await the rest of the body
//! runs on the worker that picked up the job.

pub mod coroutine;
pub mod executor_bridge;
mod waker;

pub use coroutine::{spawn_on, Coroutine};
pub use executor_bridge::{schedule_on, ScheduleOn};

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::Waker;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Opaque, once-resumable token for a suspended computation.
pub struct Continuation {
    waker: Waker,
}

impl Continuation {
    pub fn from_waker(waker: Waker) -> Self {
        Self { waker }
    }

    /// Resume the computation. What thread it continues on is up to the
    /// waker's owner; a [`Coroutine`] continues on the calling thread.
    pub fn resume(self) {
        self.waker.wake();
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation").finish_non_exhaustive()
    }
}
