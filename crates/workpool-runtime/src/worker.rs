//! WorkerSlot: one pre-spawned OS thread bound to the shared Backlog

use crate::backlog::Backlog;
use crate::parking::{new_parking, WorkerParking};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use workpool_core::state::{WorkerPriority, WorkerStatus};
use workpool_core::{id::WorkerSlotId, wpdebug};

/// A live worker thread plus the shared handles used to observe and
/// control it from the Pool and the SizingController
pub struct WorkerSlot {
    id: WorkerSlotId,
    status: Arc<AtomicU8>,
    keep_running: Arc<AtomicBool>,
    parking: Arc<dyn WorkerParking>,
    total_cpu_ns: Arc<AtomicU64>,
    join: Option<JoinHandle<()>>,
}

impl WorkerSlot {
    /// Spawn a worker thread bound to `backlog`, running until either
    /// `pool_keep_running` or its own `keep_running` flag goes false.
    pub fn spawn(
        id: WorkerSlotId,
        backlog: Arc<Backlog>,
        pool_keep_running: Arc<AtomicBool>,
        priority: WorkerPriority,
        spin_count: u32,
        park_wait: Duration,
    ) -> Self {
        let status = Arc::new(AtomicU8::new(WorkerStatus::Idle as u8));
        let keep_running = Arc::new(AtomicBool::new(true));
        let parking: Arc<dyn WorkerParking> = Arc::from(new_parking());
        let total_cpu_ns = Arc::new(AtomicU64::new(0));

        let status_t = status.clone();
        let keep_running_t = keep_running.clone();
        let parking_t = parking.clone();
        let total_cpu_ns_t = total_cpu_ns.clone();

        let join = std::thread::Builder::new()
            .name(format!("workpool-worker-{}", id.as_u32()))
            .spawn(move || {
                apply_priority(priority);
                workpool_core::log::set_worker_id(id.as_u32());
                wpdebug!("worker {} starting", id);

                let mut spins = 0u32;
                while pool_keep_running.load(Ordering::Acquire) && keep_running_t.load(Ordering::Acquire) {
                    match backlog.try_pop_skipping_terminal() {
                        Some(item) => {
                            spins = 0;
                            status_t.store(WorkerStatus::Executing as u8, Ordering::Release);
                            workpool_core::log::set_item_id(item.id().as_u64());
                            item.execute();
                            if let Some(cpu) = item.cpu_duration() {
                                total_cpu_ns_t.fetch_add(cpu.as_nanos() as u64, Ordering::Relaxed);
                            }
                            workpool_core::log::clear_item_id();
                            status_t.store(WorkerStatus::Idle as u8, Ordering::Release);
                        }
                        None => {
                            if spins < spin_count {
                                spins += 1;
                                std::hint::spin_loop();
                            } else {
                                parking_t.park(Some(park_wait));
                                spins = 0;
                            }
                        }
                    }
                }

                wpdebug!("worker {} exiting", id);
                workpool_core::log::clear_worker_id();
            })
            .expect("failed to spawn worker thread");

        WorkerSlot {
            id,
            status,
            keep_running,
            parking,
            total_cpu_ns,
            join: Some(join),
        }
    }

    pub fn id(&self) -> WorkerSlotId {
        self.id
    }

    pub fn status(&self) -> WorkerStatus {
        WorkerStatus::from(self.status.load(Ordering::Acquire))
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.status(), WorkerStatus::Idle)
    }

    pub fn total_cpu_time(&self) -> Duration {
        Duration::from_nanos(self.total_cpu_ns.load(Ordering::Relaxed))
    }

    /// Wake this slot's park, regardless of whether it is currently parked
    pub fn wake(&self) {
        self.parking.wake_one();
    }

    /// Clear `keep_running`; the worker observes this on its next loop
    /// check (immediately if parked, since `wake` is called alongside).
    pub fn signal_stop(&self) {
        self.keep_running.store(false, Ordering::Release);
        self.parking.wake_one();
    }

    /// Join the underlying thread, consuming this handle. A no-op if
    /// already joined or the pool was configured with detached workers.
    pub fn join(mut self) {
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
    }

    /// Drop the join handle without waiting for the thread to exit
    pub fn detach(mut self) {
        self.join.take();
    }
}

#[cfg(target_os = "linux")]
fn apply_priority(priority: WorkerPriority) {
    // Best effort: nice value adjustment. Requires no special privilege
    // for a non-negative nice; `Realtime` would need CAP_SYS_NICE and a
    // real-time scheduling policy, which this crate does not attempt.
    let nice = match priority {
        WorkerPriority::Low => 10,
        WorkerPriority::Normal => 0,
        WorkerPriority::AboveNormal => -5,
        WorkerPriority::High => -10,
        WorkerPriority::Realtime => -10,
    };
    unsafe {
        libc::setpriority(libc::PRIO_PROCESS, 0, nice);
    }
}

#[cfg(not(target_os = "linux"))]
fn apply_priority(_priority: WorkerPriority) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::item::WorkItem;
    use crate::pool::PoolShared;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_worker_processes_items() {
        let backlog = Arc::new(Backlog::new());
        let pool_keep_running = Arc::new(AtomicBool::new(true));
        let slot = WorkerSlot::spawn(
            WorkerSlotId::new(0),
            backlog.clone(),
            pool_keep_running.clone(),
            WorkerPriority::Normal,
            10,
            Duration::from_millis(1),
        );

        let shared = PoolShared::for_test(PoolConfig::new());
        let counter = Arc::new(AtomicUsize::new(0));
        let counter2 = counter.clone();
        let item = WorkItem::new_nullary(
            shared,
            move || {
                counter2.fetch_add(1, Ordering::SeqCst);
                Ok::<(), String>(())
            },
            None,
            None,
        );
        backlog.push(item.clone());

        item.wait().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        slot.signal_stop();
        pool_keep_running.store(false, Ordering::Release);
        slot.join();
    }
}
