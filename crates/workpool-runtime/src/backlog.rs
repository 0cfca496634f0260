//! The shared FIFO of pending work items

use crate::item::WorkItem;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Single mutual-exclusion FIFO of `WorkItem`s awaiting a worker
///
/// `push` and a successful `try_pop_skipping_terminal` both notify the
/// same condvar: producers blocked on admission wake on either event and
/// re-check their own bound.
pub struct Backlog {
    queue: Mutex<VecDeque<Arc<WorkItem>>>,
    notify: Condvar,
}

impl Backlog {
    pub fn new() -> Self {
        Backlog {
            queue: Mutex::new(VecDeque::new()),
            notify: Condvar::new(),
        }
    }

    pub fn push(&self, item: Arc<WorkItem>) {
        let mut queue = self.queue.lock().unwrap();
        queue.push_back(item);
        self.notify.notify_all();
    }

    /// Push `item` iff the queue length is currently below `bound`
    /// (a `bound` of 0 means unbounded), checking and appending under a
    /// single lock acquisition so concurrent producers can't both observe
    /// space and jointly push past it. Returns whether the push happened.
    pub fn push_if_under(&self, bound: usize, item: Arc<WorkItem>) -> bool {
        let mut queue = self.queue.lock().unwrap();
        if bound > 0 && queue.len() >= bound {
            return false;
        }
        queue.push_back(item);
        self.notify.notify_all();
        true
    }

    /// Pop the first non-terminal item, silently dropping any item that
    /// was aborted before a worker reached it
    pub fn try_pop_skipping_terminal(&self) -> Option<Arc<WorkItem>> {
        let mut queue = self.queue.lock().unwrap();
        while let Some(item) = queue.pop_front() {
            if item.is_complete() {
                continue;
            }
            self.notify.notify_all();
            return Some(item);
        }
        None
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until the backlog length drops below `bound`, up to `timeout`
    ///
    /// Returns true if space is available when this returns, false on timeout.
    pub fn wait_for_space(&self, bound: usize, timeout: Duration) -> bool {
        let queue = self.queue.lock().unwrap();
        if queue.len() < bound {
            return true;
        }
        let (queue, _) = self.notify.wait_timeout(queue, timeout).unwrap();
        queue.len() < bound
    }
}

impl Default for Backlog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::pool::PoolShared;

    fn dummy_item() -> Arc<WorkItem> {
        let shared = PoolShared::for_test(PoolConfig::new());
        WorkItem::new_nullary(shared, || Ok(()), None, None)
    }

    #[test]
    fn test_push_pop_fifo() {
        let backlog = Backlog::new();
        let a = dummy_item();
        let b = dummy_item();
        backlog.push(a.clone());
        backlog.push(b.clone());
        assert_eq!(backlog.len(), 2);

        let first = backlog.try_pop_skipping_terminal().unwrap();
        assert_eq!(first.id(), a.id());
        let second = backlog.try_pop_skipping_terminal().unwrap();
        assert_eq!(second.id(), b.id());
        assert!(backlog.try_pop_skipping_terminal().is_none());
    }

    #[test]
    fn test_pop_skips_terminal() {
        let backlog = Backlog::new();
        let a = dummy_item();
        assert!(a.abort());
        let b = dummy_item();
        backlog.push(a);
        backlog.push(b.clone());

        let popped = backlog.try_pop_skipping_terminal().unwrap();
        assert_eq!(popped.id(), b.id());
    }

    #[test]
    fn test_wait_for_space_immediate() {
        let backlog = Backlog::new();
        assert!(backlog.wait_for_space(2, Duration::from_millis(10)));
    }

    #[test]
    fn test_push_if_under_respects_bound() {
        let backlog = Backlog::new();
        assert!(backlog.push_if_under(2, dummy_item()));
        assert!(backlog.push_if_under(2, dummy_item()));
        assert!(!backlog.push_if_under(2, dummy_item()));
        assert_eq!(backlog.len(), 2);
    }

    #[test]
    fn test_push_if_under_unbounded_when_zero() {
        let backlog = Backlog::new();
        for _ in 0..5 {
            assert!(backlog.push_if_under(0, dummy_item()));
        }
        assert_eq!(backlog.len(), 5);
    }
}
