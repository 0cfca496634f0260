//! # workpool-core
//!
//! Core types for the workpool active worker pool. Platform-agnostic:
//! no threads, no OS calls. All thread/parking/timing code lives in
//! `workpool-runtime`.
//!
//! ## Modules
//!
//! - `id` - work item and worker slot identifiers
//! - `state` - item state, worker status, and worker priority enums
//! - `id_alloc` - recyclable id allocator backing elastic worker sizing
//! - `error` - pool and item error types
//! - `spinlock` - internal spinlock primitive
//! - `log` - kernel-style leveled debug printing macros
//! - `env` - environment variable utilities

#![allow(dead_code)]

pub mod env;
pub mod error;
pub mod id;
pub mod id_alloc;
pub mod log;
pub mod spinlock;
pub mod state;

pub use env::{env_get, env_get_bool, env_get_opt, env_get_str, env_is_set};
pub use error::{ItemError, PoolError, PoolResult};
pub use id::{WorkItemId, WorkerSlotId};
pub use id_alloc::SlotIdAllocator;
pub use spinlock::SpinLock;
pub use state::{ItemState, WorkerPriority, WorkerStatus};
