//! WorkItem: the unit of work tracked by a Pool

use crate::cpu_time::thread_cpu_time;
use crate::pool::PoolShared;
use std::panic::UnwindSafe;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use workpool_core::error::{ItemError, PoolError, PoolResult};
use workpool_core::id::WorkItemId;
use workpool_core::state::ItemState;

type BoxedCallable = Box<dyn FnOnce() -> Result<(), ItemError> + Send + UnwindSafe>;
type BoxedHook = Box<dyn FnOnce(&WorkItem) + Send>;

struct ItemInner {
    state: ItemState,
    error: Option<ItemError>,
    start_at: Option<Instant>,
    wall_duration: Option<Duration>,
    cpu_duration: Option<Duration>,
}

/// Single-shot, sticky completion notifier
///
/// Unlike the parking primitives used for workers (auto-reset), this
/// latches once set: any number of waiters arriving after completion
/// observe it immediately.
struct CompletionSignal {
    done: Mutex<bool>,
    condvar: Condvar,
}

impl CompletionSignal {
    fn new() -> Self {
        CompletionSignal {
            done: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    fn mark(&self) {
        let mut done = self.done.lock().unwrap();
        *done = true;
        self.condvar.notify_all();
    }

    fn is_set(&self) -> bool {
        *self.done.lock().unwrap()
    }

    /// Wait up to `timeout`; returns true if set by the time this returns
    fn wait_timeout(&self, timeout: Duration) -> bool {
        let done = self.done.lock().unwrap();
        if *done {
            return true;
        }
        let (done, _) = self.condvar.wait_timeout(done, timeout).unwrap();
        *done
    }
}

/// A unit of work enqueued into a Pool
///
/// Holds the user callable (taken exactly once by whichever worker
/// dequeues it), the optional completion hook, and the mutable
/// completion state described in the data model: state, captured error,
/// and timings.
pub struct WorkItem {
    id: WorkItemId,
    name: Option<String>,
    callable: Mutex<Option<BoxedCallable>>,
    on_complete: Mutex<Option<BoxedHook>>,
    inner: Mutex<ItemInner>,
    completion: CompletionSignal,
    pool: Arc<PoolShared>,
}

impl WorkItem {
    pub(crate) fn new_nullary<F, E>(
        pool: Arc<PoolShared>,
        callable: F,
        name: Option<String>,
        on_complete: Option<BoxedHook>,
    ) -> Arc<Self>
    where
        F: FnOnce() -> Result<(), E> + Send + UnwindSafe + 'static,
        E: std::fmt::Display,
    {
        let boxed: BoxedCallable =
            Box::new(move || callable().map_err(|e| ItemError::from_display(&e)));
        Self::from_boxed(pool, boxed, name, on_complete)
    }

    pub(crate) fn new_unary<T, F, E>(
        pool: Arc<PoolShared>,
        param: T,
        callable: F,
        name: Option<String>,
        on_complete: Option<BoxedHook>,
    ) -> Arc<Self>
    where
        T: Send + UnwindSafe + 'static,
        F: FnOnce(T) -> Result<(), E> + Send + UnwindSafe + 'static,
        E: std::fmt::Display,
    {
        let boxed: BoxedCallable =
            Box::new(move || callable(param).map_err(|e| ItemError::from_display(&e)));
        Self::from_boxed(pool, boxed, name, on_complete)
    }

    fn from_boxed(
        pool: Arc<PoolShared>,
        callable: BoxedCallable,
        name: Option<String>,
        on_complete: Option<BoxedHook>,
    ) -> Arc<Self> {
        Arc::new(WorkItem {
            id: WorkItemId::next(),
            name,
            callable: Mutex::new(Some(callable)),
            on_complete: Mutex::new(on_complete),
            inner: Mutex::new(ItemInner {
                state: ItemState::Pending,
                error: None,
                start_at: None,
                wall_duration: None,
                cpu_duration: None,
            }),
            completion: CompletionSignal::new(),
            pool,
        })
    }

    pub fn id(&self) -> WorkItemId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.completion.is_set()
    }

    pub fn was_aborted(&self) -> bool {
        matches!(self.inner.lock().unwrap().state, ItemState::Aborted)
    }

    pub fn had_error(&self) -> bool {
        matches!(self.inner.lock().unwrap().state, ItemState::CompletedErr)
    }

    pub fn error(&self) -> Option<ItemError> {
        self.inner.lock().unwrap().error.clone()
    }

    pub fn start_at(&self) -> Option<Instant> {
        self.inner.lock().unwrap().start_at
    }

    pub fn wall_duration(&self) -> Option<Duration> {
        self.inner.lock().unwrap().wall_duration
    }

    pub fn cpu_duration(&self) -> Option<Duration> {
        self.inner.lock().unwrap().cpu_duration
    }

    /// Called by a worker that just dequeued this item; takes the
    /// callable (at most once) and runs it, capturing panics and errors.
    pub(crate) fn execute(&self) {
        let callable = match self.callable.lock().unwrap().take() {
            Some(c) => c,
            None => return,
        };

        {
            let mut inner = self.inner.lock().unwrap();
            inner.state = ItemState::Running;
            inner.start_at = Some(Instant::now());
        }
        let t0 = Instant::now();
        let cpu0 = thread_cpu_time();

        let outcome = std::panic::catch_unwind(callable);

        let wall = t0.elapsed();
        let cpu = match (cpu0, thread_cpu_time()) {
            (Some(a), Some(b)) => Some(b.saturating_sub(a)),
            _ => None,
        };

        let error = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(payload) => Some(ItemError::from_panic_payload(payload.as_ref())),
        };

        self.finish(error, wall, cpu);
    }

    /// Transition to `Aborted` if still `Pending`; no-op otherwise
    pub fn abort(&self) -> bool {
        {
            let mut inner = self.inner.lock().unwrap();
            if !matches!(inner.state, ItemState::Pending) {
                return false;
            }
            inner.state = ItemState::Aborted;
            inner.wall_duration = Some(Duration::ZERO);
        }
        self.completion.mark();
        self.run_on_complete();
        true
    }

    fn finish(&self, error: Option<ItemError>, wall: Duration, cpu: Option<Duration>) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.wall_duration = Some(wall);
            inner.cpu_duration = cpu;
            inner.state = if error.is_some() {
                ItemState::CompletedErr
            } else {
                ItemState::CompletedOk
            };
            inner.error = error;
        }
        self.completion.mark();
        self.run_on_complete();
    }

    fn run_on_complete(&self) {
        if let Some(hook) = self.on_complete.lock().unwrap().take() {
            hook(self);
        }
    }

    /// Block until terminal; `ShuttingDown` if the pool stops first
    pub fn wait(&self) -> PoolResult<()> {
        let mut spins = 0u32;
        loop {
            if self.is_complete() {
                return Ok(());
            }
            if !self.pool.keep_running() {
                return Err(PoolError::ShuttingDown);
            }
            if spins < self.pool.config().spin_count {
                spins += 1;
                std::hint::spin_loop();
                continue;
            }
            self.completion.wait_timeout(self.pool.config().park_wait());
            spins = 0;
        }
    }

    /// Block up to `timeout`; true on terminal, false on timeout
    pub fn wait_for(&self, timeout: Duration) -> PoolResult<bool> {
        let deadline = Instant::now() + timeout;
        let mut spins = 0u32;
        loop {
            if self.is_complete() {
                return Ok(true);
            }
            if !self.pool.keep_running() {
                return Err(PoolError::ShuttingDown);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            if spins < self.pool.config().spin_count {
                spins += 1;
                std::hint::spin_loop();
                continue;
            }
            self.completion
                .wait_timeout(remaining.min(self.pool.config().park_wait()));
            spins = 0;
        }
    }

    /// Block until terminal, calling `hook` every `interval` without completion;
    /// a `false` return from `hook` ends the wait early (returns false)
    pub fn wait_with_progress<F>(&self, interval: Duration, mut hook: F) -> PoolResult<bool>
    where
        F: FnMut() -> bool,
    {
        loop {
            if self.is_complete() {
                return Ok(true);
            }
            if !self.pool.keep_running() {
                return Err(PoolError::ShuttingDown);
            }
            if self.completion.wait_timeout(interval) {
                return Ok(true);
            }
            if !hook() {
                return Ok(false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;

    fn shared() -> Arc<PoolShared> {
        PoolShared::for_test(PoolConfig::new())
    }

    #[test]
    fn test_execute_ok() {
        let item = WorkItem::new_nullary(shared(), || Ok::<(), String>(()), None, None);
        item.execute();
        assert!(item.is_complete());
        assert!(!item.had_error());
        assert!(item.wall_duration().is_some());
    }

    #[test]
    fn test_execute_err_captured() {
        let item = WorkItem::new_nullary(shared(), || Err::<(), _>("boom"), None, None);
        item.execute();
        assert!(item.is_complete());
        assert!(item.had_error());
        assert_eq!(item.error().unwrap().message(), "boom");
    }

    #[test]
    fn test_execute_panic_captured() {
        let item = WorkItem::new_nullary(
            shared(),
            || -> Result<(), String> { panic!("kaboom") },
            None,
            None,
        );
        item.execute();
        assert!(item.had_error());
        assert!(item.error().unwrap().did_panic());
    }

    #[test]
    fn test_abort_before_start() {
        let item = WorkItem::new_nullary(shared(), || Ok::<(), String>(()), None, None);
        assert!(item.abort());
        assert!(item.is_complete());
        assert!(item.was_aborted());
        // second abort is a no-op
        assert!(!item.abort());
    }

    #[test]
    fn test_abort_after_execute_is_noop() {
        let item = WorkItem::new_nullary(shared(), || Ok::<(), String>(()), None, None);
        item.execute();
        assert!(!item.abort());
        assert!(!item.was_aborted());
    }

    #[test]
    fn test_on_complete_runs_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let hook: BoxedHook = Box::new(move |_item| {
            count2.fetch_add(1, Ordering::SeqCst);
        });
        let item = WorkItem::new_nullary(shared(), || Ok::<(), String>(()), None, Some(hook));
        item.execute();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
