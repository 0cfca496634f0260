//! Per-thread CPU time sampling
//!
//! Optional capability: on Linux this reads `CLOCK_THREAD_CPUTIME_ID`,
//! which only reports the calling thread's own consumption, so it must be
//! called from inside the worker thread being measured. Elsewhere it is
//! unavailable and callers get `None` throughout.

use std::time::Duration;

#[cfg(target_os = "linux")]
pub fn thread_cpu_time() -> Option<Duration> {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    let ret = unsafe { libc::clock_gettime(libc::CLOCK_THREAD_CPUTIME_ID, &mut ts) };
    if ret == 0 {
        Some(Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32))
    } else {
        None
    }
}

#[cfg(not(target_os = "linux"))]
pub fn thread_cpu_time() -> Option<Duration> {
    None
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn test_thread_cpu_time_monotonic() {
        let t0 = thread_cpu_time().expect("clock_gettime should succeed on linux");
        let mut acc = 0u64;
        for i in 0..5_000_000u64 {
            acc = acc.wrapping_add(i);
        }
        std::hint::black_box(acc);
        let t1 = thread_cpu_time().unwrap();
        assert!(t1 >= t0);
    }
}
