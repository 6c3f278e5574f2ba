use batch_transform_core::WorkItem;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// FIFO of pending items shared by every worker in a pass.
///
/// Built once from the discovery order; nothing is pushed after the pool
/// starts. `dequeue` pops under the lock, so each item is handed out once.
pub struct WorkQueue {
    items: Mutex<VecDeque<WorkItem>>,
    total: usize,
}

impl WorkQueue {
    pub fn new(items: Vec<WorkItem>) -> Self {
        let total = items.len();
        WorkQueue {
            items: Mutex::new(VecDeque::from(items)),
            total,
        }
    }

    /// Remove and return the next item, or `None` once drained
    pub fn dequeue(&self) -> Option<WorkItem> {
        self.items.lock().pop_front()
    }

    /// Items still pending
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items the queue was built with
    pub fn total(&self) -> usize {
        self.total
    }
}

impl FromIterator<WorkItem> for WorkQueue {
    fn from_iter<I: IntoIterator<Item = WorkItem>>(iter: I) -> Self {
        WorkQueue::new(iter.into_iter().collect())
    }
}
