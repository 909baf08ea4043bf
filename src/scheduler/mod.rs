//! Per-worker queues and the policies for taking work out of them.
//!
//! Every worker of a stealing pool owns one [`WorkQueue`]. The owner pops
//! through [`TaskLanes::pop`]; idle peers take through [`TaskLanes::steal`]
//! and never wait for a busy victim.

pub mod priority;
pub(crate) mod work_queue;

pub use priority::Priority;
pub(crate) use priority::TieredLanes;
pub(crate) use work_queue::WorkQueue;

use crate::executor::Task;
use std::collections::VecDeque;

/// The storage behind one worker's queue lock.
pub(crate) trait TaskLanes: Default + Send + 'static {
    fn push(&mut self, task: Task);

    /// Owner-side dequeue.
    fn pop(&mut self) -> Option<Task>;

    /// Thief-side dequeue.
    fn steal(&mut self) -> Option<Task>;

    fn len(&self) -> usize;
}

/// Plain FIFO lane. Owner and thieves both take from the front, so tasks
/// leave in submission order whoever runs them.
impl TaskLanes for VecDeque<Task> {
    fn push(&mut self, task: Task) {
        self.push_back(task);
    }

    fn pop(&mut self) -> Option<Task> {
        self.pop_front()
    }

    fn steal(&mut self) -> Option<Task> {
        self.pop_front()
    }

    fn len(&self) -> usize {
        VecDeque::len(self)
    }
}

/// Where a thief starts scanning the other workers' queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StealOrder {
    /// Index order from zero.
    Sequential,
    /// A random index, then wrapping around. Spreads idle workers across
    /// victims instead of letting them pile onto queue zero.
    RandomStart,
}

impl StealOrder {
    pub(crate) fn start(self, num_queues: usize) -> usize {
        use rand::Rng;

        match self {
            StealOrder::Sequential => 0,
            StealOrder::RandomStart => rand::thread_rng().gen_range(0..num_queues),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_lanes() {
        let mut lanes: VecDeque<Task> = VecDeque::new();
        let a = Task::new(|| {});
        let b = Task::new(|| {});
        let c = Task::new(|| {});
        let ids = [a.id, b.id, c.id];

        TaskLanes::push(&mut lanes, a);
        TaskLanes::push(&mut lanes, b);
        TaskLanes::push(&mut lanes, c);

        assert_eq!(TaskLanes::len(&lanes), 3);
        assert_eq!(TaskLanes::pop(&mut lanes).map(|t| t.id), Some(ids[0]));
        assert_eq!(lanes.steal().map(|t| t.id), Some(ids[1]));
        assert_eq!(TaskLanes::pop(&mut lanes).map(|t| t.id), Some(ids[2]));
        assert_eq!(TaskLanes::len(&lanes), 0);
    }

    #[test]
    fn test_steal_order_start() {
        assert_eq!(StealOrder::Sequential.start(8), 0);
        for _ in 0..100 {
            assert!(StealOrder::RandomStart.start(8) < 8);
        }
    }
}
