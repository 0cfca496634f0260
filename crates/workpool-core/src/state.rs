//! WorkItem state, worker status, and worker priority types

use core::fmt;

/// Terminal/non-terminal state of a WorkItem
///
/// The discriminant alone is stored atomically on the item; when the
/// terminal state is `CompletedErr` the captured error lives in a
/// separate `Option<PoolError>` slot on the item (see `workpool::WorkItem`),
/// mirroring how the source scheduler keeps its state enum a plain
/// `repr(u8)` and parks richer payloads alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ItemState {
    /// Enqueued, not yet picked up by a worker
    Pending = 0,

    /// Currently executing on a worker
    Running = 1,

    /// Finished without error
    CompletedOk = 2,

    /// Finished with a captured error
    CompletedErr = 3,

    /// Aborted before a worker began executing it
    Aborted = 4,
}

impl ItemState {
    /// True for any of the three terminal states
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            ItemState::CompletedOk | ItemState::CompletedErr | ItemState::Aborted
        )
    }

    #[inline]
    pub const fn is_pending(&self) -> bool {
        matches!(self, ItemState::Pending)
    }

    #[inline]
    pub const fn is_running(&self) -> bool {
        matches!(self, ItemState::Running)
    }
}

impl From<u8> for ItemState {
    fn from(v: u8) -> Self {
        match v {
            0 => ItemState::Pending,
            1 => ItemState::Running,
            2 => ItemState::CompletedOk,
            3 => ItemState::CompletedErr,
            4 => ItemState::Aborted,
            _ => ItemState::Pending,
        }
    }
}

impl From<ItemState> for u8 {
    fn from(state: ItemState) -> u8 {
        state as u8
    }
}

/// Reported status of a WorkerSlot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerStatus {
    /// Parked or spinning, waiting for backlog work
    Idle = 0,
    /// Currently running a user callable
    Executing = 1,
}

impl From<u8> for WorkerStatus {
    fn from(v: u8) -> Self {
        match v {
            1 => WorkerStatus::Executing,
            _ => WorkerStatus::Idle,
        }
    }
}

impl From<WorkerStatus> for u8 {
    fn from(s: WorkerStatus) -> u8 {
        s as u8
    }
}

/// OS-level scheduling priority requested for worker threads
///
/// This is advisory: platforms that cannot honor a given priority (or
/// that require elevated privileges for `Realtime`) fall back to the OS
/// default rather than failing pool construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum WorkerPriority {
    Low = 0,
    Normal = 1,
    AboveNormal = 2,
    High = 3,
    Realtime = 4,
}

impl Default for WorkerPriority {
    fn default() -> Self {
        WorkerPriority::Normal
    }
}

impl From<u8> for WorkerPriority {
    fn from(v: u8) -> Self {
        match v {
            0 => WorkerPriority::Low,
            1 => WorkerPriority::Normal,
            2 => WorkerPriority::AboveNormal,
            3 => WorkerPriority::High,
            4 => WorkerPriority::Realtime,
            _ => WorkerPriority::Normal,
        }
    }
}

impl From<WorkerPriority> for u8 {
    fn from(p: WorkerPriority) -> u8 {
        p as u8
    }
}

impl fmt::Display for WorkerPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerPriority::Low => write!(f, "LOW"),
            WorkerPriority::Normal => write!(f, "NORMAL"),
            WorkerPriority::AboveNormal => write!(f, "ABOVE_NORMAL"),
            WorkerPriority::High => write!(f, "HIGH"),
            WorkerPriority::Realtime => write!(f, "REALTIME"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_state_terminal() {
        assert!(!ItemState::Pending.is_terminal());
        assert!(!ItemState::Running.is_terminal());
        assert!(ItemState::CompletedOk.is_terminal());
        assert!(ItemState::CompletedErr.is_terminal());
        assert!(ItemState::Aborted.is_terminal());
    }

    #[test]
    fn test_item_state_roundtrip() {
        for v in 0u8..=4 {
            let s = ItemState::from(v);
            assert_eq!(u8::from(s), v);
        }
    }

    #[test]
    fn test_worker_priority_ordering() {
        assert!(WorkerPriority::Low < WorkerPriority::Normal);
        assert!(WorkerPriority::Normal < WorkerPriority::AboveNormal);
        assert!(WorkerPriority::AboveNormal < WorkerPriority::High);
        assert!(WorkerPriority::High < WorkerPriority::Realtime);
    }

    #[test]
    fn test_worker_priority_default() {
        assert_eq!(WorkerPriority::default(), WorkerPriority::Normal);
    }
}
