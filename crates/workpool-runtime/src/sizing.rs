//! SizingController: grows the pool under sustained overload with
//! exponential backoff on the growth threshold, shrinks it under
//! sustained idleness.
//!
//! Structured as a small periodic thread following the teacher's
//! timer-thread lifecycle (an `Arc`-shared shutdown flag, a bounded
//! sleep per tick), re-purposed here from preemption monitoring to
//! elastic sizing.

use crate::pool::PoolShared;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use workpool_core::wpdebug;

const TICK_INTERVAL: Duration = Duration::from_millis(100);

struct ThresholdState {
    current_threshold: Duration,
    last_overload_at: Option<Instant>,
    last_underload_at: Option<Instant>,
}

impl ThresholdState {
    fn new(min: Duration) -> Self {
        ThresholdState {
            current_threshold: min,
            last_overload_at: None,
            last_underload_at: None,
        }
    }
}

fn tick(shared: &PoolShared, state: &mut ThresholdState) {
    let config = shared.config();
    let worker_count = shared.worker_count();
    let backlog_len = shared.backlog().len();
    let any_idle = shared.any_idle();

    let overloaded = worker_count < config.max_workers && !any_idle && backlog_len >= worker_count;

    if overloaded {
        let now = Instant::now();
        let since = match state.last_overload_at {
            Some(at) => now.duration_since(at),
            None => {
                state.last_overload_at = Some(now);
                Duration::ZERO
            }
        };
        if since > state.current_threshold {
            if shared.grow_one() {
                wpdebug!(
                    "sizing: grew to {} workers (threshold was {:?})",
                    shared.worker_count(),
                    state.current_threshold
                );
                state.last_overload_at = None;
                let grown = state.current_threshold * config.grow_overload_factor;
                let max = Duration::from_millis(config.grow_overload_max_ms);
                state.current_threshold = grown.min(max);
            }
        }
        return;
    }

    state.last_overload_at = None;
    state.current_threshold = Duration::from_millis(config.grow_overload_min_ms);

    let underloaded = worker_count > config.initial_workers && any_idle && backlog_len == 0;

    if underloaded {
        let now = Instant::now();
        let since = match state.last_underload_at {
            Some(at) => now.duration_since(at),
            None => {
                state.last_underload_at = Some(now);
                return;
            }
        };
        if since > Duration::from_millis(config.shrink_idle_ms) && shared.shrink_last_idle() {
            wpdebug!("sizing: shrank to {} workers", shared.worker_count());
            state.last_underload_at = None;
        }
    } else {
        state.last_underload_at = None;
    }
}

pub(crate) fn spawn_sizing_thread(shared: Arc<PoolShared>) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("workpool-sizing".to_string())
        .spawn(move || {
            let mut state = ThresholdState::new(Duration::from_millis(shared.config().grow_overload_min_ms));
            while shared.keep_running() {
                tick(&shared, &mut state);
                std::thread::sleep(TICK_INTERVAL);
            }
        })
        .expect("failed to spawn sizing thread")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;

    #[test]
    fn test_overload_detection_thresholds() {
        let config = PoolConfig::new()
            .initial_workers(1)
            .max_workers(4)
            .grow_overload_min_ms(1)
            .grow_overload_max_ms(10)
            .grow_overload_factor(2);
        let shared = PoolShared::for_test(config);
        let mut state = ThresholdState::new(Duration::from_millis(1));

        // no workers at all in for_test() shared state, so worker_count() == 0
        // and backlog_len (0) >= worker_count (0) with no idle slot: overloaded.
        tick(&shared, &mut state);
        assert!(state.last_overload_at.is_some());
    }
}
