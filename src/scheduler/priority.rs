use super::TaskLanes;
use crate::executor::Task;
use std::collections::VecDeque;

/// Scheduling tier of a task. Lower variants run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Priority {
    High = 0,
    #[default]
    Normal = 1,
    Low = 2,
}

impl Priority {
    pub const COUNT: usize = 3;

    /// All tiers, highest first.
    pub const ALL: [Priority; Priority::COUNT] = [Priority::High, Priority::Normal, Priority::Low];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One FIFO lane per priority tier, all behind the owning queue's lock.
///
/// The owner pops from the head of the highest non-empty tier; thieves take
/// from the tail of the same tier so the two ends rarely meet. There is no
/// aging: a steady stream of `High` work starves `Low` work.
#[derive(Debug, Default)]
pub(crate) struct TieredLanes {
    lanes: [VecDeque<Task>; Priority::COUNT],
}

impl TieredLanes {
    #[cfg(test)]
    pub(crate) fn tier_len(&self, priority: Priority) -> usize {
        self.lanes[priority.index()].len()
    }
}

impl TaskLanes for TieredLanes {
    fn push(&mut self, task: Task) {
        self.lanes[task.priority.index()].push_back(task);
    }

    fn pop(&mut self) -> Option<Task> {
        self.lanes.iter_mut().find_map(|lane| lane.pop_front())
    }

    fn steal(&mut self) -> Option<Task> {
        self.lanes.iter_mut().find_map(|lane| lane.pop_back())
    }

    fn len(&self) -> usize {
        self.lanes.iter().map(VecDeque::len).sum()
    }
}
