//! # workpool
//!
//! An active worker pool: a process-resident set of pre-spawned worker
//! threads that dequeue user-supplied callables from a single shared,
//! bounded FIFO backlog, execute them, and publish per-item completion
//! state back to the caller. Built for finer control than a generic
//! runtime thread pool: bounded backlogs, explicit batch waits, per-item
//! abort, and elastic sizing tied to observed load.
//!
//! ## Quick start
//!
//! ```ignore
//! use workpool::{Pool, PoolConfig};
//!
//! let pool = Pool::new(PoolConfig::from_env()).unwrap();
//! let item = pool.enqueue(|| {
//!     println!("work");
//!     Ok::<(), String>(())
//! }).unwrap();
//! item.wait().unwrap();
//! pool.stop();
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      User Code                              │
//! │         Pool::enqueue() / ChildPool::enqueue()               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Backlog                              │
//! │           bounded FIFO, admission backpressure               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//!    ┌───────────┐      ┌───────────┐      ┌───────────────┐
//!    │WorkerSlot │      │WorkerSlot │      │SizingController│
//!    │  Thread   │      │  Thread   │      │     Thread     │
//!    └───────────┘      └───────────┘      └───────────────┘
//! ```

// Re-export core types
pub use workpool_core::{
    error::{ItemError, PoolError, PoolResult},
    id::{WorkItemId, WorkerSlotId},
    state::{ItemState, WorkerPriority, WorkerStatus},
};

// Re-export the logging macro family for debug output
pub use workpool_core::{wpdebug, wperror, wpinfo, wplog, wptrace, wpwarn};
pub use workpool_core::log::{
    init as init_logging, set_flush_enabled, set_log_level, set_time_enabled, LogLevel,
};

// Re-export env utilities
pub use workpool_core::{env_get, env_get_bool, env_get_opt, env_get_str, env_is_set};

// Re-export runtime types
pub use workpool_runtime::{Pool, PoolConfig, WorkItem, WorkerInfo};

use std::panic::UnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Extends `Pool` with construction of a typed `ChildPool`
///
/// Lives as an extension trait rather than an inherent impl because
/// `ChildPool<T>`'s generic parameter is most naturally expressed at
/// this facade layer (see module docs); `Pool` itself stays
/// parameter-agnostic in `workpool-runtime`.
pub trait PoolChildExt {
    fn create_child_pool<T>(&self, max_child_depth: Option<i64>) -> ChildPool<T>
    where
        T: Send + UnwindSafe + 'static;
}

impl PoolChildExt for Pool {
    fn create_child_pool<T>(&self, max_child_depth: Option<i64>) -> ChildPool<T>
    where
        T: Send + UnwindSafe + 'static,
    {
        ChildPool::new(self.clone(), max_child_depth)
    }
}

/// Running totals accumulated as tracked items are purged from a `ChildPool`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChildPoolTotals {
    pub wall_duration: Duration,
    pub cpu_duration: Duration,
}

/// A typed, bounded facade over a `Pool` that groups a batch of items,
/// tracks their completion, and supports aggregate waits and failure
/// inspection.
///
/// `T` is preserved end to end: each enqueued callable receives a `T`
/// supplied at enqueue time. The pool underneath remains type-erased;
/// `ChildPool` just boxes each closure before handing it off, so there
/// is no downcast or runtime type dispatch involved.
pub struct ChildPool<T> {
    pool: Pool,
    max_child_depth: Option<i64>,
    tracked: Mutex<Vec<Arc<WorkItem>>>,
    totals: Mutex<ChildPoolTotals>,
    _marker: std::marker::PhantomData<fn(T)>,
}

impl<T> ChildPool<T>
where
    T: Send + UnwindSafe + 'static,
{
    pub fn new(pool: Pool, max_child_depth: Option<i64>) -> Self {
        ChildPool {
            pool,
            max_child_depth,
            tracked: Mutex::new(Vec::new()),
            totals: Mutex::new(ChildPoolTotals::default()),
            _marker: std::marker::PhantomData,
        }
    }

    /// Enqueue `param` paired with `callable`, admitting against
    /// whichever of the global backlog bound or `max_child_depth` is
    /// tighter. Purges completed tracked items on success.
    pub fn enqueue<F, E>(&self, param: T, callable: F) -> PoolResult<Arc<WorkItem>>
    where
        F: FnOnce(T) -> Result<(), E> + Send + UnwindSafe + 'static,
        E: std::fmt::Display,
    {
        self.admit_child()?;
        let item = self.pool.enqueue_param(param, callable, None)?;
        self.tracked.lock().unwrap().push(item.clone());
        self.purge_completed();
        Ok(item)
    }

    /// Block until fewer than `max_child_depth` tracked items are still
    /// non-terminal, mirroring the spin-then-park discipline `Pool`'s own
    /// backlog admission uses. Observes pool shutdown so a producer
    /// blocked here returns `ShuttingDown` instead of hanging forever once
    /// `stop()` has discarded the backlog and nothing will ever complete
    /// the tracked items it's waiting on.
    fn admit_child(&self) -> PoolResult<()> {
        let Some(bound) = self.max_child_depth else {
            return Ok(());
        };
        if bound <= 0 {
            return Ok(());
        }
        let bound = bound as usize;
        let mut spins = 0u32;
        loop {
            if !self.pool.keep_running() {
                return Err(PoolError::ShuttingDown);
            }
            let active = {
                let tracked = self.tracked.lock().unwrap();
                tracked.iter().filter(|i| !i.is_complete()).count()
            };
            if active < bound {
                return Ok(());
            }
            if spins < 100 {
                spins += 1;
                std::hint::spin_loop();
                continue;
            }
            std::thread::sleep(Duration::from_millis(1));
            spins = 0;
        }
    }

    /// Move completed items out of the tracked set and into the running
    /// totals. Items with a captured error are retained until inspected
    /// via `failed_items`/`throw_aggregate`.
    fn purge_completed(&self) {
        let mut tracked = self.tracked.lock().unwrap();
        let mut totals = self.totals.lock().unwrap();
        tracked.retain(|item| {
            if !item.is_complete() {
                return true;
            }
            if item.had_error() {
                return true;
            }
            if let Some(d) = item.wall_duration() {
                totals.wall_duration += d;
            }
            if let Some(d) = item.cpu_duration() {
                totals.cpu_duration += d;
            }
            false
        });
    }

    pub fn totals(&self) -> ChildPoolTotals {
        *self.totals.lock().unwrap()
    }

    pub fn any_failed(&self) -> bool {
        self.tracked.lock().unwrap().iter().any(|i| i.had_error())
    }

    pub fn failed_items(&self) -> Vec<Arc<WorkItem>> {
        self.tracked
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.had_error())
            .cloned()
            .collect()
    }

    /// Attempt to abort every tracked item; true iff none had already started.
    pub fn abort_all(&self) -> bool {
        self.tracked
            .lock()
            .unwrap()
            .iter()
            .fold(true, |all_ok, item| item.abort() && all_ok)
    }

    /// Wait for every tracked item to reach a terminal state.
    pub fn wait_all(&self) -> PoolResult<()> {
        self.purge_completed();
        let items: Vec<_> = self.tracked.lock().unwrap().clone();
        for item in items {
            item.wait()?;
        }
        self.purge_completed();
        Ok(())
    }

    /// Wait for every tracked item, up to `timeout` total; stops early
    /// (returning false) on the first timeout without aborting the rest.
    pub fn wait_all_timeout(&self, timeout: Duration) -> PoolResult<bool> {
        self.purge_completed();
        let items: Vec<_> = self.tracked.lock().unwrap().clone();
        let deadline = std::time::Instant::now() + timeout;
        for item in items {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if !item.wait_for(remaining)? {
                return Ok(false);
            }
        }
        self.purge_completed();
        Ok(true)
    }

    /// Wait for every tracked item, calling `hook` every `interval`
    /// without completion; a `false` return ends the batch wait early.
    pub fn wait_all_with_progress<F>(&self, interval: Duration, mut hook: F) -> PoolResult<bool>
    where
        F: FnMut() -> bool,
    {
        self.purge_completed();
        let items: Vec<_> = self.tracked.lock().unwrap().clone();
        for item in items {
            if !item.wait_with_progress(interval, &mut hook)? {
                return Ok(false);
            }
        }
        self.purge_completed();
        Ok(true)
    }

    /// Raise `PoolError::AggregateFailed` bundling every tracked item's
    /// captured error, if any exist.
    pub fn throw_aggregate(&self) -> PoolResult<()> {
        let errors: Vec<_> = self
            .tracked
            .lock()
            .unwrap()
            .iter()
            .filter_map(|i| i.error())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PoolError::AggregateFailed(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_pool() -> Pool {
        Pool::new(PoolConfig::new().initial_workers(2).max_workers(2)).unwrap()
    }

    #[test]
    fn test_child_pool_aggregate_failure() {
        let pool = small_pool();
        let child: ChildPool<usize> = pool.create_child_pool(None);

        for i in 0..5usize {
            child
                .enqueue(i, |n| {
                    if n == 1 || n == 3 {
                        Err(format!("item {} failed", n))
                    } else {
                        Ok(())
                    }
                })
                .unwrap();
        }

        child.wait_all().unwrap();
        assert!(child.any_failed());
        assert_eq!(child.failed_items().len(), 2);

        let err = child.throw_aggregate().unwrap_err();
        match err {
            PoolError::AggregateFailed(errs) => assert_eq!(errs.len(), 2),
            _ => panic!("expected AggregateFailed"),
        }

        pool.stop();
    }

    #[test]
    fn test_child_pool_totals_accumulate() {
        let pool = small_pool();
        let child: ChildPool<()> = pool.create_child_pool(None);
        child.enqueue((), |_| Ok::<(), String>(())).unwrap();
        child.wait_all().unwrap();
        assert!(child.totals().wall_duration >= Duration::ZERO);
        pool.stop();
    }
}
