use crate::executor::TaskPanic;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("pool stopped")]
    PoolStopped,

    #[error("task panicked: {0}")]
    TaskPanicked(TaskPanic),

    #[error("task dropped before it completed")]
    Abandoned,

    #[error("config error: {0}")]
    Config(String),

    #[error("executor error: {0}")]
    Executor(String),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }

    pub fn is_pool_stopped(&self) -> bool {
        matches!(self, Error::PoolStopped)
    }

    /// Returns the captured panic if this error came from a task body.
    pub fn into_panic(self) -> Option<TaskPanic> {
        match self {
            Error::TaskPanicked(panic) => Some(panic),
            _ => None,
        }
    }
}
