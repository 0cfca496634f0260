//! Compile-time defaults for `PoolConfig`

/// Default initial worker count: logical CPU count (falls back to 1)
pub fn initial_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Default ceiling: 4x logical CPUs
pub fn max_workers() -> usize {
    initial_workers() * 4
}

pub const DETACHED_WORKERS: bool = false;
pub const MAX_BACKLOG: i64 = 0;
pub const SPIN_COUNT: u32 = 100;
pub const PARK_WAIT_MS: u64 = 1;
pub const GROW_OVERLOAD_MIN_MS: u64 = 100;
pub const GROW_OVERLOAD_MAX_MS: u64 = 6400;
pub const GROW_OVERLOAD_FACTOR: u32 = 2;
pub const SHRINK_IDLE_MS: u64 = 30_000;
