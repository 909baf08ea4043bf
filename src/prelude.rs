pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::executor::{Executor, PriorityPool, SharedPool, StealingPool, TaskHandle};
pub use crate::scheduler::Priority;

#[cfg(feature = "async")]
pub use crate::async_bridge::{schedule_on, spawn_on, Coroutine};
