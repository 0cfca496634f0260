//! Kernel-style print macros for workpool
//!
//! Provides thread-safe, context-aware debug output similar to Linux kernel's printk.
//! Automatically includes worker id, item id, and optional timestamp.
//!
//! # Environment Variables
//!
//! - `WORKPOOL_FLUSH_EPRINT=1` - Flush stderr after each print (useful for debugging crashes)
//! - `WORKPOOL_LOG_LEVEL=<level>` - Set log level: 0=off, 1=error, 2=warn, 3=info, 4=debug, 5=trace
//! - `WORKPOOL_LOG_TIME=1` - Include nanosecond timestamp in output
//!
//! # Output Format
//!
//! Without timestamp: `[LEVEL] [w<worker>:i<item>] message`
//! With timestamp:    `[LEVEL] [<ns>] [w<worker>:i<item>] message`
//!
//! Examples:
//! - `[DEBUG] [w0:i5] dequeued item`
//! - `[INFO]  [12345678] [w2:i--] worker idle`
//! - `[ERROR] [w--:i--] not running inside a worker`
//!
//! # Usage
//!
//! ```ignore
//! use workpool_core::{wplog, wpdebug, wpinfo, wpwarn, wperror};
//!
//! wpdebug!("executing item {}", item_id);
//! wpinfo!("item completed");
//! wpwarn!("unexpected state: {:?}", state);
//! wperror!("worker panicked");
//! ```

use crate::env::env_get_bool;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Instant;

/// Log levels (matches common conventions)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "[ERROR]",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Info => "[INFO] ",
            LogLevel::Debug => "[DEBUG]",
            LogLevel::Trace => "[TRACE]",
        }
    }
}

// Global configuration (initialized once)
static FLUSH_ENABLED: AtomicBool = AtomicBool::new(false);
static TIME_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);
static INITIALIZED: AtomicBool = AtomicBool::new(false);

// Start time for relative timestamps
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize logging from environment variables
///
/// Called automatically on first log, but can be called explicitly for
/// deterministic initialization.
pub fn init() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return; // Already initialized
    }

    START_TIME.get_or_init(Instant::now);

    FLUSH_ENABLED.store(env_get_bool("WORKPOOL_FLUSH_EPRINT", false), Ordering::Relaxed);
    TIME_ENABLED.store(env_get_bool("WORKPOOL_LOG_TIME", false), Ordering::Relaxed);

    if let Ok(val) = std::env::var("WORKPOOL_LOG_LEVEL") {
        let level = match val.to_lowercase().as_str() {
            "off" | "0" => LogLevel::Off,
            "error" | "1" => LogLevel::Error,
            "warn" | "2" => LogLevel::Warn,
            "info" | "3" => LogLevel::Info,
            "debug" | "4" => LogLevel::Debug,
            "trace" | "5" => LogLevel::Trace,
            _ => LogLevel::Info,
        };
        LOG_LEVEL.store(level as u8, Ordering::Relaxed);
    }
}

/// Check if flush is enabled
#[inline]
pub fn flush_enabled() -> bool {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    FLUSH_ENABLED.load(Ordering::Relaxed)
}

/// Check if timestamp is enabled
#[inline]
pub fn time_enabled() -> bool {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    TIME_ENABLED.load(Ordering::Relaxed)
}

/// Get current log level
#[inline]
pub fn log_level() -> LogLevel {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Set log level programmatically
pub fn set_log_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Set flush mode programmatically
pub fn set_flush_enabled(enabled: bool) {
    FLUSH_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Set time display programmatically
pub fn set_time_enabled(enabled: bool) {
    TIME_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Check if a log level is enabled
#[inline]
pub fn level_enabled(level: LogLevel) -> bool {
    level as u8 <= log_level() as u8
}

/// Get elapsed nanoseconds since start (safe for any stack)
#[inline]
pub fn elapsed_ns() -> u64 {
    let start = START_TIME.get_or_init(Instant::now);
    start.elapsed().as_nanos() as u64
}

// Thread-local context, set by the runtime as it enters/leaves a worker loop iteration.
thread_local! {
    static WORKER_ID: std::cell::Cell<Option<u32>> = const { std::cell::Cell::new(None) };
    static ITEM_ID: std::cell::Cell<Option<u64>> = const { std::cell::Cell::new(None) };
}

/// Set current worker id for this thread (called by the runtime)
pub fn set_worker_id(id: u32) {
    WORKER_ID.with(|w| w.set(Some(id)));
}

/// Clear worker id (called by the runtime on thread exit)
pub fn clear_worker_id() {
    WORKER_ID.with(|w| w.set(None));
}

/// Set current item id (called by the runtime while a worker is executing an item)
pub fn set_item_id(id: u64) {
    ITEM_ID.with(|i| i.set(Some(id)));
}

/// Clear item id (called by the runtime once an item completes)
pub fn clear_item_id() {
    ITEM_ID.with(|i| i.set(None));
}

/// Get current worker id
#[inline]
pub fn get_worker_id() -> Option<u32> {
    WORKER_ID.with(|w| w.get())
}

/// Get current item id
#[inline]
pub fn get_item_id() -> Option<u64> {
    ITEM_ID.with(|i| i.get())
}

/// Format context string [w<id>:i<id>]
fn format_context() -> String {
    let worker = match get_worker_id() {
        Some(id) => format!("w{}", id),
        None => "w--".to_string(),
    };
    let item = match get_item_id() {
        Some(id) => format!("i{}", id),
        None => "i--".to_string(),
    };
    format!("[{}:{}]", worker, item)
}

/// Internal: leveled print with context
#[doc(hidden)]
pub fn _wplog_impl(level: LogLevel, args: std::fmt::Arguments<'_>) {
    if !level_enabled(level) {
        return;
    }

    let stderr = std::io::stderr();
    let mut handle = stderr.lock();

    let _ = write!(handle, "{} ", level.prefix());

    if time_enabled() {
        let _ = write!(handle, "[{}] ", elapsed_ns());
    }

    let _ = write!(handle, "{} ", format_context());

    let _ = handle.write_fmt(args);
    let _ = handle.write_all(b"\n");

    if flush_enabled() {
        let _ = handle.flush();
    }
}

// ============================================================================
// Public Macros
// ============================================================================

/// Unleveled log, always routed through the info bucket
///
/// Kept around for call sites that just want a line in the log without
/// picking a severity, mirroring a plain kernel `printk` call.
#[macro_export]
macro_rules! wplog {
    ($($arg:tt)*) => {{
        $crate::log::_wplog_impl($crate::log::LogLevel::Info, format_args!($($arg)*));
    }};
}

/// Error level log with context
#[macro_export]
macro_rules! wperror {
    ($($arg:tt)*) => {{
        $crate::log::_wplog_impl($crate::log::LogLevel::Error, format_args!($($arg)*));
    }};
}

/// Warning level log with context
#[macro_export]
macro_rules! wpwarn {
    ($($arg:tt)*) => {{
        $crate::log::_wplog_impl($crate::log::LogLevel::Warn, format_args!($($arg)*));
    }};
}

/// Info level log with context
#[macro_export]
macro_rules! wpinfo {
    ($($arg:tt)*) => {{
        $crate::log::_wplog_impl($crate::log::LogLevel::Info, format_args!($($arg)*));
    }};
}

/// Debug level log with context
#[macro_export]
macro_rules! wpdebug {
    ($($arg:tt)*) => {{
        $crate::log::_wplog_impl($crate::log::LogLevel::Debug, format_args!($($arg)*));
    }};
}

/// Trace level log with context
#[macro_export]
macro_rules! wptrace {
    ($($arg:tt)*) => {{
        $crate::log::_wplog_impl($crate::log::LogLevel::Trace, format_args!($($arg)*));
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_levels() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn test_level_from_u8() {
        assert_eq!(LogLevel::from_u8(0), LogLevel::Off);
        assert_eq!(LogLevel::from_u8(1), LogLevel::Error);
        assert_eq!(LogLevel::from_u8(4), LogLevel::Debug);
        assert_eq!(LogLevel::from_u8(99), LogLevel::Trace);
    }

    #[test]
    fn test_context() {
        assert_eq!(get_worker_id(), None);
        assert_eq!(get_item_id(), None);

        set_worker_id(5);
        assert_eq!(get_worker_id(), Some(5));

        set_item_id(42);
        assert_eq!(get_item_id(), Some(42));

        clear_worker_id();
        clear_item_id();
        assert_eq!(get_worker_id(), None);
        assert_eq!(get_item_id(), None);
    }

    #[test]
    fn test_elapsed_ns() {
        let t1 = elapsed_ns();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let t2 = elapsed_ns();
        assert!(t2 > t1);
    }

    #[test]
    fn test_macros_compile() {
        set_log_level(LogLevel::Off);

        wperror!("error {}", "msg");
        wpwarn!("warn");
        wpinfo!("info");
        wpdebug!("debug");
        wptrace!("trace");
    }
}
