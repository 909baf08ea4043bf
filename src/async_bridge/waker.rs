//! Waker that polls its coroutine on whichever thread wakes it.

use super::BoxFuture;
use crate::executor::{PanicHandler, PanicStrategy};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};

const IDLE: u8 = 0;
const POLLING: u8 = 1;
const NOTIFIED: u8 = 2;
const DONE: u8 = 3;

/// A suspended future plus the state needed to resume it exactly once per
/// wakeup.
///
/// A wake that arrives while the future is being polled (for instance
/// because the job it just submitted already ran on a worker) is recorded
/// as `NOTIFIED` and turned into another poll by the thread that is
/// already polling, so the future is never polled concurrently.
pub(crate) struct CoroutineWaker {
    state: AtomicU8,
    future: Mutex<Option<BoxFuture<'static, ()>>>,
    panic_handler: PanicHandler,
}

impl CoroutineWaker {
    pub(crate) fn new(future: BoxFuture<'static, ()>) -> Arc<Self> {
        Arc::new(Self {
            state: AtomicU8::new(IDLE),
            future: Mutex::new(Some(future)),
            // a panic here has nobody to report to
            panic_handler: PanicHandler::new(PanicStrategy::Abort),
        })
    }

    pub(crate) fn is_done(&self) -> bool {
        self.state.load(Ordering::Acquire) == DONE
    }

    /// Poll the future on the current thread, or leave a note for the thread
    /// that is polling it right now.
    pub(crate) fn resume(self: &Arc<Self>) {
        let mut state = self.state.load(Ordering::Acquire);
        loop {
            let next = match state {
                IDLE => POLLING,
                POLLING => NOTIFIED,
                _ => return,
            };
            match self
                .state
                .compare_exchange_weak(state, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) if next == POLLING => break,
                Ok(_) => return,
                Err(actual) => state = actual,
            }
        }

        self.poll_until_parked();
    }

    fn poll_until_parked(self: &Arc<Self>) {
        let waker = Waker::from(self.clone());
        let mut cx = Context::from_waker(&waker);

        loop {
            let mut slot = self.future.lock();
            let finished = match slot.as_mut() {
                Some(future) => !matches!(
                    self.panic_handler.execute(|| future.as_mut().poll(&mut cx)),
                    Ok(Poll::Pending)
                ),
                None => true,
            };

            if finished {
                *slot = None;
                drop(slot);
                self.state.store(DONE, Ordering::Release);
                return;
            }
            drop(slot);

            match self
                .state
                .compare_exchange(POLLING, IDLE, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                // woken mid-poll
                Err(_) => self.state.store(POLLING, Ordering::Release),
            }
        }
    }
}

impl Wake for CoroutineWaker {
    fn wake(self: Arc<Self>) {
        self.resume();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.resume();
    }
}
