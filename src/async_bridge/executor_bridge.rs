//! The `schedule_on` awaitable.

use super::Continuation;
use crate::error::Result;
use crate::executor::Executor;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

/// Future returned by [`schedule_on`].
///
/// The first poll hands the current continuation to the executor and
/// suspends. It completes once the executor has run that job, or right
/// away with the executor's error if the job was refused.
#[must_use = "futures do nothing unless awaited"]
pub struct ScheduleOn<'a, E: ?Sized> {
    executor: &'a E,
    fired: Option<Arc<AtomicBool>>,
}

/// Suspend the current computation and resume it from a job on `executor`.
///
/// Fire-and-forget: the executor gives no ordering or priority beyond what
/// any other submitted job gets.
pub fn schedule_on<E: Executor + ?Sized>(executor: &E) -> ScheduleOn<'_, E> {
    ScheduleOn {
        executor,
        fired: None,
    }
}

impl<E: Executor + ?Sized> Future for ScheduleOn<'_, E> {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(fired) = &self.fired {
            // spurious wakeups before the job ran keep us parked
            return if fired.load(Ordering::Acquire) {
                Poll::Ready(Ok(()))
            } else {
                Poll::Pending
            };
        }

        let fired = Arc::new(AtomicBool::new(false));
        let continuation = Continuation::from_waker(cx.waker().clone());
        let flag = fired.clone();
        // set before submitting: the job may run before `execute` returns
        self.fired = Some(fired);

        let submitted = self.executor.execute(Box::new(move || {
            flag.store(true, Ordering::Release);
            continuation.resume();
        }));

        match submitted {
            Ok(()) => Poll::Pending,
            Err(err) => Poll::Ready(Err(err)),
        }
    }
}

impl<E: ?Sized> fmt::Debug for ScheduleOn<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleOn")
            .field("submitted", &self.fired.is_some())
            .finish()
    }
}
