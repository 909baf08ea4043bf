use super::waker::CoroutineWaker;
use super::Continuation;
use crate::error::Result;
use crate::executor::Executor;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::task::Waker;

/// A lazily started computation driven by its own waker.
///
/// Nothing runs until [`resume`](Self::resume) or a wakeup. Each wakeup
/// polls the body on the waking thread, so awaiting
/// [`schedule_on`](super::schedule_on) moves the rest of the body onto a
/// pool worker.
///
/// A panic escaping the body aborts the process.
pub struct Coroutine {
    inner: Arc<CoroutineWaker>,
}

impl Coroutine {
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            inner: CoroutineWaker::new(Box::pin(future)),
        }
    }

    /// Run the body on the current thread until it next suspends.
    /// Does nothing once it has finished.
    pub fn resume(&self) {
        self.inner.resume();
    }

    pub fn is_done(&self) -> bool {
        self.inner.is_done()
    }

    /// A token that resumes this coroutine when consumed.
    pub fn continuation(&self) -> Continuation {
        Continuation::from_waker(Waker::from(self.inner.clone()))
    }
}

impl fmt::Debug for Coroutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coroutine")
            .field("done", &self.is_done())
            .finish()
    }
}

/// Start `future` as a coroutine whose first poll happens on `executor`.
pub fn spawn_on<E, F>(executor: &E, future: F) -> Result<()>
where
    E: Executor + ?Sized,
    F: Future<Output = ()> + Send + 'static,
{
    let continuation = Coroutine::new(future).continuation();
    executor.execute(Box::new(move || continuation.resume()))
}
