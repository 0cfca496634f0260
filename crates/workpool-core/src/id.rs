//! Work item and worker slot identifiers

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a WorkItem
///
/// Monotonically increasing within a process; never reused, so a stale
/// `WorkItemId` printed in a log after the item completed is still
/// unambiguous.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct WorkItemId(u64);

static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(0);

impl WorkItemId {
    /// Allocate the next identity in process-wide sequence
    #[inline]
    pub fn next() -> Self {
        WorkItemId(NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkItemId({})", self.0)
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a WorkerSlot (an OS thread managed by the Pool)
///
/// A 32-bit value recycled by `SlotIdAllocator` (see `id_alloc`) as slots
/// are added and removed by the sizing controller.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct WorkerSlotId(u32);

impl WorkerSlotId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        WorkerSlotId(id)
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for WorkerSlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkerSlotId({})", self.0)
    }
}

impl fmt::Display for WorkerSlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
