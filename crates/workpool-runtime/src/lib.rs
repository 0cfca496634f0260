//! # workpool-runtime
//!
//! Platform-facing runtime for the workpool active worker pool: the
//! park/wake primitive, the worker-slot set, the shared backlog, the
//! pool itself, and the elastic sizing controller.

#![allow(dead_code)]

pub mod backlog;
pub mod config;
pub mod cpu_time;
pub mod item;
pub mod parking;
pub mod pool;
pub mod sizing;
pub mod worker;

pub use backlog::Backlog;
pub use config::PoolConfig;
pub use item::WorkItem;
pub use parking::{new_parking, WorkerParking};
pub use pool::{Pool, WorkerInfo};
pub use worker::WorkerSlot;
