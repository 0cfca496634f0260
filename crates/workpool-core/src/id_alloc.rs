//! Allocator for recycled `WorkerSlotId`s
//!
//! Backs the sizing controller's grow/shrink cycle: growing claims a slot
//! id (fresh or recycled from a prior shrink), shrinking releases one back.
//! Uses a LIFO free stack so a recently-shrunk id is the first reused,
//! which keeps the live id range tight after repeated grow/shrink churn.

use crate::error::{PoolError, PoolResult};
use crate::id::WorkerSlotId;
use crate::spinlock::SpinLock;
use core::sync::atomic::{AtomicU32, Ordering};

/// Allocates and recycles `WorkerSlotId`s up to a fixed ceiling
pub struct SlotIdAllocator {
    free_stack: SpinLock<Vec<u32>>,
    next_fresh: AtomicU32,
    max_slots: u32,
    allocated_count: AtomicU32,
}

impl SlotIdAllocator {
    /// Create an allocator that will never hand out more than `max_slots` live ids
    pub fn new(max_slots: usize) -> Self {
        Self {
            free_stack: SpinLock::new(Vec::new()),
            next_fresh: AtomicU32::new(0),
            max_slots: max_slots as u32,
            allocated_count: AtomicU32::new(0),
        }
    }

    /// Allocate a slot id, preferring a recycled one (LIFO) over a fresh one
    pub fn allocate(&self) -> PoolResult<WorkerSlotId> {
        {
            let mut free = self.free_stack.lock();
            if let Some(id) = free.pop() {
                self.allocated_count.fetch_add(1, Ordering::Relaxed);
                return Ok(WorkerSlotId::new(id));
            }
        }

        loop {
            let current = self.next_fresh.load(Ordering::Acquire);
            if current >= self.max_slots {
                return Err(PoolError::ConfigInvalid("no worker slot ids remaining"));
            }
            match self.next_fresh.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.allocated_count.fetch_add(1, Ordering::Relaxed);
                    return Ok(WorkerSlotId::new(current));
                }
                Err(_) => continue,
            }
        }
    }

    /// Release a slot id back to the free stack for reuse
    pub fn release(&self, id: WorkerSlotId) {
        let mut free = self.free_stack.lock();
        free.push(id.as_u32());
        self.allocated_count.fetch_sub(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn allocated_count(&self) -> u32 {
        self.allocated_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn max_slots(&self) -> u32 {
        self.max_slots
    }

    pub fn free_stack_size(&self) -> usize {
        self.free_stack.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_sequential() {
        let alloc = SlotIdAllocator::new(100);
        let id1 = alloc.allocate().unwrap();
        let id2 = alloc.allocate().unwrap();
        let id3 = alloc.allocate().unwrap();
        assert_eq!(id1.as_u32(), 0);
        assert_eq!(id2.as_u32(), 1);
        assert_eq!(id3.as_u32(), 2);
        assert_eq!(alloc.allocated_count(), 3);
    }

    #[test]
    fn test_allocate_release_reuse() {
        let alloc = SlotIdAllocator::new(100);
        let id1 = alloc.allocate().unwrap();
        let _id2 = alloc.allocate().unwrap();
        assert_eq!(alloc.allocated_count(), 2);

        alloc.release(id1);
        assert_eq!(alloc.allocated_count(), 1);

        let id3 = alloc.allocate().unwrap();
        assert_eq!(id3, id1);
        assert_eq!(alloc.allocated_count(), 2);
    }

    #[test]
    fn test_allocate_exhaustion() {
        let alloc = SlotIdAllocator::new(3);
        let _id1 = alloc.allocate().unwrap();
        let _id2 = alloc.allocate().unwrap();
        let _id3 = alloc.allocate().unwrap();
        assert!(matches!(alloc.allocate(), Err(PoolError::ConfigInvalid(_))));
    }

    #[test]
    fn test_concurrent_allocation() {
        use std::sync::Arc;
        use std::thread;

        let alloc = Arc::new(SlotIdAllocator::new(10000));
        let mut handles = vec![];
        for _ in 0..4 {
            let alloc = Arc::clone(&alloc);
            handles.push(thread::spawn(move || {
                let mut ids = vec![];
                for _ in 0..1000 {
                    ids.push(alloc.allocate().unwrap());
                }
                ids
            }));
        }

        let mut all_ids: Vec<WorkerSlotId> = vec![];
        for h in handles {
            all_ids.extend(h.join().unwrap());
        }
        assert_eq!(all_ids.len(), 4000);
        all_ids.sort();
        all_ids.dedup();
        assert_eq!(all_ids.len(), 4000);
    }
}
