//! Pool configuration
//!
//! Provides compile-time defaults with runtime environment overrides.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Environment variables (runtime)
//! 2. Library defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use workpool_runtime::config::PoolConfig;
//!
//! // Use defaults with env overrides
//! let config = PoolConfig::from_env();
//!
//! // Or customize programmatically
//! let config = PoolConfig::new()
//!     .initial_workers(8)
//!     .max_backlog(256);
//! ```

pub mod defaults;

use std::time::Duration;
use workpool_core::env::env_get;
use workpool_core::error::PoolError;
use workpool_core::state::WorkerPriority;

/// Pool configuration with builder pattern.
///
/// Use `from_env()` to start with compile-time defaults and apply
/// any environment variable overrides, or `new()` to ignore the
/// environment entirely (useful for deterministic tests).
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Worker threads spawned at construction
    pub initial_workers: usize,
    /// Ceiling the sizing controller will not grow past
    pub max_workers: usize,
    /// OS scheduling priority requested for worker threads
    pub worker_priority: WorkerPriority,
    /// If true, worker threads do not block process exit
    pub detached_workers: bool,
    /// Backlog bound; 0 means unbounded (never rejects admission)
    pub max_backlog: i64,
    /// Busy-spin iterations before a worker parks, or before a producer
    /// parks while waiting for backlog space
    pub spin_count: u32,
    /// Bounded park duration per park call
    pub park_wait_ms: u64,
    /// Initial overload duration threshold before the first growth
    pub grow_overload_min_ms: u64,
    /// Ceiling the overload threshold backs off to
    pub grow_overload_max_ms: u64,
    /// Multiplier applied to the overload threshold after each growth
    pub grow_overload_factor: u32,
    /// Sustained underload duration before a shrink
    pub shrink_idle_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl PoolConfig {
    /// Create config from compile-time defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `WORKPOOL_INITIAL_WORKERS`
    /// - `WORKPOOL_MAX_WORKERS`
    /// - `WORKPOOL_WORKER_PRIORITY` (0-4, see `WorkerPriority`)
    /// - `WORKPOOL_DETACHED_WORKERS` (0/1)
    /// - `WORKPOOL_MAX_BACKLOG`
    /// - `WORKPOOL_SPIN_COUNT`
    /// - `WORKPOOL_PARK_WAIT_MS`
    /// - `WORKPOOL_GROW_OVERLOAD_MIN_MS`
    /// - `WORKPOOL_GROW_OVERLOAD_MAX_MS`
    /// - `WORKPOOL_GROW_OVERLOAD_FACTOR`
    /// - `WORKPOOL_SHRINK_IDLE_MS`
    pub fn from_env() -> Self {
        Self {
            initial_workers: env_get("WORKPOOL_INITIAL_WORKERS", defaults::initial_workers()),
            max_workers: env_get("WORKPOOL_MAX_WORKERS", defaults::max_workers()),
            worker_priority: WorkerPriority::from(env_get::<u8>("WORKPOOL_WORKER_PRIORITY", 1)),
            detached_workers: env_get(
                "WORKPOOL_DETACHED_WORKERS",
                if defaults::DETACHED_WORKERS { 1u8 } else { 0 },
            ) != 0,
            max_backlog: env_get("WORKPOOL_MAX_BACKLOG", defaults::MAX_BACKLOG),
            spin_count: env_get("WORKPOOL_SPIN_COUNT", defaults::SPIN_COUNT),
            park_wait_ms: env_get("WORKPOOL_PARK_WAIT_MS", defaults::PARK_WAIT_MS),
            grow_overload_min_ms: env_get(
                "WORKPOOL_GROW_OVERLOAD_MIN_MS",
                defaults::GROW_OVERLOAD_MIN_MS,
            ),
            grow_overload_max_ms: env_get(
                "WORKPOOL_GROW_OVERLOAD_MAX_MS",
                defaults::GROW_OVERLOAD_MAX_MS,
            ),
            grow_overload_factor: env_get(
                "WORKPOOL_GROW_OVERLOAD_FACTOR",
                defaults::GROW_OVERLOAD_FACTOR,
            ),
            shrink_idle_ms: env_get("WORKPOOL_SHRINK_IDLE_MS", defaults::SHRINK_IDLE_MS),
        }
    }

    /// Create config with explicit defaults (no env override).
    pub fn new() -> Self {
        Self {
            initial_workers: defaults::initial_workers(),
            max_workers: defaults::max_workers(),
            worker_priority: WorkerPriority::default(),
            detached_workers: defaults::DETACHED_WORKERS,
            max_backlog: defaults::MAX_BACKLOG,
            spin_count: defaults::SPIN_COUNT,
            park_wait_ms: defaults::PARK_WAIT_MS,
            grow_overload_min_ms: defaults::GROW_OVERLOAD_MIN_MS,
            grow_overload_max_ms: defaults::GROW_OVERLOAD_MAX_MS,
            grow_overload_factor: defaults::GROW_OVERLOAD_FACTOR,
            shrink_idle_ms: defaults::SHRINK_IDLE_MS,
        }
    }

    // Builder methods

    pub fn initial_workers(mut self, n: usize) -> Self {
        self.initial_workers = n;
        self
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.max_workers = n;
        self
    }

    pub fn worker_priority(mut self, p: WorkerPriority) -> Self {
        self.worker_priority = p;
        self
    }

    pub fn detached_workers(mut self, enable: bool) -> Self {
        self.detached_workers = enable;
        self
    }

    pub fn max_backlog(mut self, n: i64) -> Self {
        self.max_backlog = n;
        self
    }

    pub fn spin_count(mut self, n: u32) -> Self {
        self.spin_count = n;
        self
    }

    pub fn park_wait_ms(mut self, ms: u64) -> Self {
        self.park_wait_ms = ms;
        self
    }

    pub fn grow_overload_min_ms(mut self, ms: u64) -> Self {
        self.grow_overload_min_ms = ms;
        self
    }

    pub fn grow_overload_max_ms(mut self, ms: u64) -> Self {
        self.grow_overload_max_ms = ms;
        self
    }

    pub fn grow_overload_factor(mut self, factor: u32) -> Self {
        self.grow_overload_factor = factor;
        self
    }

    pub fn shrink_idle_ms(mut self, ms: u64) -> Self {
        self.shrink_idle_ms = ms;
        self
    }

    pub fn park_wait(&self) -> Duration {
        Duration::from_millis(self.park_wait_ms)
    }

    /// Validate configuration, returning `PoolError::ConfigInvalid` on violation.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.initial_workers == 0 {
            return Err(PoolError::ConfigInvalid("initial_workers must be > 0"));
        }
        if self.max_workers < self.initial_workers {
            return Err(PoolError::ConfigInvalid(
                "max_workers must be >= initial_workers",
            ));
        }
        if self.max_backlog < 0 {
            return Err(PoolError::ConfigInvalid("max_backlog must be >= 0"));
        }
        if self.grow_overload_min_ms == 0 {
            return Err(PoolError::ConfigInvalid("grow_overload_min_ms must be > 0"));
        }
        if self.grow_overload_max_ms < self.grow_overload_min_ms {
            return Err(PoolError::ConfigInvalid(
                "grow_overload_max_ms must be >= grow_overload_min_ms",
            ));
        }
        if self.grow_overload_factor < 1 {
            return Err(PoolError::ConfigInvalid("grow_overload_factor must be >= 1"));
        }
        Ok(())
    }

    /// Print configuration (for debugging)
    pub fn print(&self) {
        eprintln!("Pool Configuration:");
        eprintln!("  initial_workers:        {}", self.initial_workers);
        eprintln!("  max_workers:            {}", self.max_workers);
        eprintln!("  worker_priority:        {}", self.worker_priority);
        eprintln!("  detached_workers:       {}", self.detached_workers);
        eprintln!("  max_backlog:            {}", self.max_backlog);
        eprintln!("  spin_count:             {}", self.spin_count);
        eprintln!("  park_wait_ms:           {}", self.park_wait_ms);
        eprintln!("  grow_overload_min_ms:   {}", self.grow_overload_min_ms);
        eprintln!("  grow_overload_max_ms:   {}", self.grow_overload_max_ms);
        eprintln!("  grow_overload_factor:   {}", self.grow_overload_factor);
        eprintln!("  shrink_idle_ms:         {}", self.shrink_idle_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env() {
        let config = PoolConfig::from_env();
        assert!(config.initial_workers >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = PoolConfig::new()
            .initial_workers(2)
            .max_workers(8)
            .max_backlog(16);

        assert_eq!(config.initial_workers, 2);
        assert_eq!(config.max_workers, 8);
        assert_eq!(config.max_backlog, 16);
    }

    #[test]
    fn test_validation() {
        let config = PoolConfig::new().initial_workers(0);
        assert!(config.validate().is_err());

        let config = PoolConfig::new().initial_workers(8).max_workers(2);
        assert!(config.validate().is_err());

        let config = PoolConfig::new().max_backlog(-1);
        assert!(config.validate().is_err());
    }
}
