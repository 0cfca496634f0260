//! Pool: owns the Backlog and the WorkerSlot set

use crate::backlog::Backlog;
use crate::config::PoolConfig;
use crate::item::WorkItem;
use crate::sizing::spawn_sizing_thread;
use crate::worker::WorkerSlot;
use std::panic::UnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use workpool_core::error::{PoolError, PoolResult};
use workpool_core::id::WorkerSlotId;
use workpool_core::id_alloc::SlotIdAllocator;
use workpool_core::spinlock::SpinLock;
use workpool_core::state::WorkerStatus;
use workpool_core::{wpinfo, wpwarn};

type OnCompleteHook = Box<dyn FnOnce(&WorkItem) + Send>;

/// Shared pool state, kept alive by every outstanding `WorkItem` and
/// `Pool` handle via `Arc`. See §9 of the design notes: a `WorkItem`
/// borrows its owning pool through this `Arc` rather than a raw pointer,
/// so the shared state strictly outlives every handle derived from it.
pub struct PoolShared {
    pub(crate) config: PoolConfig,
    backlog: Arc<Backlog>,
    slots: SpinLock<Vec<WorkerSlot>>,
    slot_ids: SlotIdAllocator,
    keep_running: Arc<AtomicBool>,
    stopped: AtomicBool,
    sizing_handle: SpinLock<Option<JoinHandle<()>>>,
}

impl PoolShared {
    fn new(config: PoolConfig) -> Arc<Self> {
        let slot_ids = SlotIdAllocator::new(config.max_workers);
        let shared = Arc::new(PoolShared {
            config,
            backlog: Arc::new(Backlog::new()),
            slots: SpinLock::new(Vec::new()),
            slot_ids,
            keep_running: Arc::new(AtomicBool::new(true)),
            stopped: AtomicBool::new(false),
            sizing_handle: SpinLock::new(None),
        });

        {
            let mut slots = shared.slots.lock();
            for _ in 0..shared.config.initial_workers {
                let id = shared
                    .slot_ids
                    .allocate()
                    .expect("initial worker ids must fit within max_workers");
                slots.push(shared.spawn_slot(id));
            }
        }

        let handle = spawn_sizing_thread(shared.clone());
        *shared.sizing_handle.lock() = Some(handle);

        shared
    }

    /// Build bare shared state with no worker threads and no sizing
    /// thread, for unit-testing `WorkItem` in isolation.
    #[cfg(test)]
    pub(crate) fn for_test(config: PoolConfig) -> Arc<Self> {
        Arc::new(PoolShared {
            slot_ids: SlotIdAllocator::new(config.max_workers),
            config,
            backlog: Arc::new(Backlog::new()),
            slots: SpinLock::new(Vec::new()),
            keep_running: Arc::new(AtomicBool::new(true)),
            stopped: AtomicBool::new(false),
            sizing_handle: SpinLock::new(None),
        })
    }

    fn spawn_slot(&self, id: WorkerSlotId) -> WorkerSlot {
        WorkerSlot::spawn(
            id,
            self.backlog.clone(),
            self.keep_running.clone(),
            self.config.worker_priority,
            self.config.spin_count,
            self.config.park_wait(),
        )
    }

    pub(crate) fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub(crate) fn keep_running(&self) -> bool {
        self.keep_running.load(Ordering::Acquire)
    }

    pub(crate) fn backlog(&self) -> &Backlog {
        &self.backlog
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.slots.lock().len()
    }

    pub(crate) fn any_idle(&self) -> bool {
        self.slots.lock().iter().any(|s| s.is_idle())
    }

    /// Wake one idle slot, if any; harmless if none are idle right now,
    /// since the next dequeue attempt will observe the new tail anyway.
    pub(crate) fn wake_idle_slot(&self) {
        if let Some(slot) = self.slots.lock().iter().find(|s| s.is_idle()) {
            slot.wake();
        }
    }

    pub(crate) fn worker_infos(&self) -> Vec<WorkerInfo> {
        self.slots
            .lock()
            .iter()
            .map(|s| WorkerInfo {
                id: s.id(),
                status: s.status(),
                total_cpu_time: s.total_cpu_time(),
            })
            .collect()
    }

    /// Add one worker slot if under `max_workers`; returns true if grown.
    pub(crate) fn grow_one(&self) -> bool {
        let mut slots = self.slots.lock();
        if slots.len() >= self.config.max_workers {
            return false;
        }
        let id = match self.slot_ids.allocate() {
            Ok(id) => id,
            Err(_) => return false,
        };
        wpinfo!("growing pool: adding worker slot {}", id);
        slots.push(self.spawn_slot(id));
        true
    }

    /// Remove the highest-id currently-idle slot, if pool size allows;
    /// returns true if shrunk.
    pub(crate) fn shrink_last_idle(&self) -> bool {
        let removed = {
            let mut slots = self.slots.lock();
            if slots.len() <= self.config.initial_workers {
                return false;
            }
            let pos = slots.iter().rposition(|s| s.is_idle());
            match pos {
                Some(pos) => Some(slots.remove(pos)),
                None => None,
            }
        };

        match removed {
            Some(slot) => {
                wpinfo!("shrinking pool: removing worker slot {}", slot.id());
                let id = slot.id();
                slot.signal_stop();
                slot.join();
                self.slot_ids.release(id);
                true
            }
            None => false,
        }
    }

    fn stop_inner(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.keep_running.store(false, Ordering::Release);

        if let Some(handle) = self.sizing_handle.lock().take() {
            let _ = handle.join();
        }

        let slots: Vec<WorkerSlot> = std::mem::take(&mut *self.slots.lock());
        for slot in &slots {
            slot.signal_stop();
        }
        for slot in slots {
            if self.config.detached_workers {
                slot.detach();
            } else {
                slot.join();
            }
        }
    }
}

/// Snapshot of one worker slot for the read-only `Pool::workers()` view
#[derive(Debug, Clone, Copy)]
pub struct WorkerInfo {
    pub id: WorkerSlotId,
    pub status: WorkerStatus,
    pub total_cpu_time: Duration,
}

/// An active worker pool: bounded backlog, elastic sizing, per-item
/// completion state.
#[derive(Clone)]
pub struct Pool {
    shared: Arc<PoolShared>,
}

impl Pool {
    /// Construct a Pool, spawning `initial_workers` worker threads and
    /// the sizing controller. Fails with `ConfigInvalid` on a malformed
    /// configuration.
    pub fn new(config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;
        Ok(Pool {
            shared: PoolShared::new(config),
        })
    }

    pub(crate) fn shared(&self) -> Arc<PoolShared> {
        self.shared.clone()
    }

    /// Enqueue a nullary callable; admits against `max_backlog`, blocking
    /// the caller with a spin-then-park wait if the backlog is full.
    pub fn enqueue<F, E>(&self, callable: F) -> PoolResult<Arc<WorkItem>>
    where
        F: FnOnce() -> Result<(), E> + Send + UnwindSafe + 'static,
        E: std::fmt::Display,
    {
        self.enqueue_with_hook(callable, None)
    }

    /// Like `enqueue`, with a completion hook run exactly once on the
    /// item's terminal transition.
    pub fn enqueue_with_hook<F, E>(
        &self,
        callable: F,
        on_complete: Option<OnCompleteHook>,
    ) -> PoolResult<Arc<WorkItem>>
    where
        F: FnOnce() -> Result<(), E> + Send + UnwindSafe + 'static,
        E: std::fmt::Display,
    {
        let item = WorkItem::new_nullary(self.shared.clone(), callable, None, on_complete);
        self.insert(item.clone())?;
        Ok(item)
    }

    /// Enqueue a callable that receives `param` when invoked by a worker.
    pub fn enqueue_param<T, F, E>(
        &self,
        param: T,
        callable: F,
        on_complete: Option<OnCompleteHook>,
    ) -> PoolResult<Arc<WorkItem>>
    where
        T: Send + UnwindSafe + 'static,
        F: FnOnce(T) -> Result<(), E> + Send + UnwindSafe + 'static,
        E: std::fmt::Display,
    {
        let item = WorkItem::new_unary(self.shared.clone(), param, callable, None, on_complete);
        self.insert(item.clone())?;
        Ok(item)
    }

    /// True until `stop()` has begun tearing the pool down.
    pub fn keep_running(&self) -> bool {
        self.shared.keep_running()
    }

    /// Admit `item` into the backlog, blocking with a spin-then-park wait
    /// while the backlog is at `max_backlog`. The bound check and the push
    /// happen under one lock acquisition (`Backlog::push_if_under`) so
    /// concurrent producers can never jointly push the backlog past the
    /// bound.
    fn insert(&self, item: Arc<WorkItem>) -> PoolResult<()> {
        let bound = self.shared.config.max_backlog.max(0) as usize;
        let mut spins = 0u32;
        loop {
            if !self.shared.keep_running() {
                return Err(PoolError::ShuttingDown);
            }
            if self.shared.backlog().push_if_under(bound, item.clone()) {
                self.shared.wake_idle_slot();
                return Ok(());
            }
            if spins < self.shared.config.spin_count {
                spins += 1;
                std::hint::spin_loop();
                continue;
            }
            self.shared
                .backlog()
                .wait_for_space(bound, self.shared.config.park_wait());
            spins = 0;
        }
    }

    /// Abort `item` if it is still `Pending`.
    pub fn abort(&self, item: &WorkItem) -> bool {
        item.abort()
    }

    pub fn worker_count(&self) -> usize {
        self.shared.worker_count()
    }

    pub fn workers(&self) -> Vec<WorkerInfo> {
        self.shared.worker_infos()
    }

    /// Idempotent shutdown: stops the sizing controller, wakes and joins
    /// every worker slot (or detaches them, per `detached_workers`), and
    /// clears the slot set. Items still on the backlog are discarded;
    /// callers waiting on their handles observe `ShuttingDown`.
    pub fn stop(&self) {
        self.shared.stop_inner();
    }

    /// Alias for `stop`, kept for parity with the source library's surface.
    pub fn dispose(&self) {
        self.stop();
    }
}

impl Drop for PoolShared {
    fn drop(&mut self) {
        if !self.stopped.load(Ordering::Acquire) {
            wpwarn!("pool dropped without an explicit stop(); stopping now");
            self.stop_inner();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn small_config() -> PoolConfig {
        PoolConfig::new().initial_workers(2).max_workers(2)
    }

    #[test]
    fn test_enqueue_and_wait() {
        let pool = Pool::new(small_config()).unwrap();
        let item = pool.enqueue(|| Ok::<(), String>(())).unwrap();
        item.wait().unwrap();
        assert!(!item.had_error());
        pool.stop();
    }

    #[test]
    fn test_admission_bound_blocks() {
        let config = PoolConfig::new()
            .initial_workers(1)
            .max_workers(1)
            .max_backlog(2);
        let pool = Pool::new(config).unwrap();

        let items: Vec<_> = (0..3)
            .map(|_| {
                pool.enqueue(|| {
                    std::thread::sleep(Duration::from_millis(50));
                    Ok::<(), String>(())
                })
                .unwrap()
            })
            .collect();

        for item in &items {
            item.wait().unwrap();
            assert!(!item.had_error());
        }
        pool.stop();
    }

    #[test]
    fn test_abort_before_start() {
        let pool = Pool::new(PoolConfig::new().initial_workers(1).max_workers(1)).unwrap();
        let ran = Arc::new(AtomicUsize::new(0));

        let a = pool
            .enqueue(|| {
                std::thread::sleep(Duration::from_millis(100));
                Ok::<(), String>(())
            })
            .unwrap();

        let ran2 = ran.clone();
        let b = pool
            .enqueue(move || {
                ran2.fetch_add(1, Ordering::SeqCst);
                Ok::<(), String>(())
            })
            .unwrap();

        assert!(pool.abort(&b));
        assert!(b.is_complete());
        assert!(b.was_aborted());

        a.wait().unwrap();
        assert!(!a.had_error());
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        pool.stop();
    }

    #[test]
    fn test_stop_is_idempotent() {
        let pool = Pool::new(small_config()).unwrap();
        pool.stop();
        pool.stop();
        assert_eq!(pool.worker_count(), 0);
    }

    #[test]
    fn test_config_invalid_rejected() {
        let config = PoolConfig::new().initial_workers(4).max_workers(1);
        assert!(matches!(Pool::new(config), Err(PoolError::ConfigInvalid(_))));
    }
}
