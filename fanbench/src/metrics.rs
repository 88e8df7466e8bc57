use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

/// Point-in-time resource reading, never mutated after capture.
#[derive(Debug, Clone, Copy, Default)]
pub struct Snapshot {
    /// Wall clock at capture, milliseconds since the UNIX epoch.
    pub wall_ms: u64,
    /// Resident memory of the process, in bytes.
    pub mem_bytes: u64,
    /// CPU time consumed by the whole process, user plus system, across all
    /// of its threads. Zero where the platform cannot report it.
    pub cpu: Duration,
    /// Live OS threads of the process.
    pub threads: usize,
}

/// Resource metrics capability.
///
/// Injected into the benchmark runner so it never queries process-global
/// state directly and tests can substitute deterministic readings.
pub trait Collect {
    /// Captures a snapshot, with no side effects on the measured subsystem.
    fn snapshot(&self) -> Snapshot;
}

/// Collector backed by the OS view of the current process.
#[derive(Debug)]
pub struct ProcessMetrics {
    pid: Pid,
}

impl ProcessMetrics {
    pub fn new() -> Self {
        let pid = Pid::from_u32(std::process::id());

        Self { pid }
    }
}

impl Default for ProcessMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Collect for ProcessMetrics {
    fn snapshot(&self) -> Snapshot {
        let wall_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        // A fresh `System` per capture: a reused one keeps threads that have
        // exited since the previous refresh in its task list, so the count
        // would only ever grow.
        let mut system = System::new_with_specifics(
            RefreshKind::new().with_processes(ProcessRefreshKind::everything()),
        );
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::everything(),
        );

        let (mem_bytes, threads) = match system.process(self.pid) {
            Some(process) => {
                let threads = process.tasks().map_or(0, |tasks| tasks.len());
                (process.memory(), threads)
            }
            None => (0, 0),
        };

        Snapshot {
            wall_ms,
            mem_bytes,
            cpu: cpu_time(),
            threads,
        }
    }
}

/// CPU time of the whole process. Best-effort: zero on failure.
#[cfg(unix)]
fn cpu_time() -> Duration {
    let mut usage = core::mem::MaybeUninit::<libc::rusage>::zeroed();
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return Duration::ZERO;
    }
    let usage = unsafe { usage.assume_init() };

    timeval(usage.ru_utime) + timeval(usage.ru_stime)
}

#[cfg(unix)]
fn timeval(tv: libc::timeval) -> Duration {
    Duration::new(tv.tv_sec.max(0) as u64, (tv.tv_usec.max(0) as u32) * 1000)
}

#[cfg(not(unix))]
fn cpu_time() -> Duration {
    Duration::ZERO
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_process_snapshot_is_populated() {
        let metrics = ProcessMetrics::new();
        let snapshot = metrics.snapshot();

        assert!(snapshot.wall_ms > 0);
        assert!(snapshot.mem_bytes > 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_process_snapshot_sees_live_threads() {
        let metrics = ProcessMetrics::new();

        assert!(metrics.snapshot().threads >= 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_snapshot_stops_counting_exited_threads() {
        use std::{
            thread,
            time::{Duration, Instant},
        };

        use crate::latch::Latch;

        let metrics = ProcessMetrics::new();
        let baseline = metrics.snapshot().threads;

        let release = Latch::new(1);
        let mut threads = Vec::new();
        for _ in 0..16 {
            let release = release.clone();
            threads.push(thread::spawn(move || release.wait()));
        }

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut parked = metrics.snapshot().threads;
        while parked < baseline + 16 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
            parked = metrics.snapshot().threads;
        }
        assert!(parked >= baseline + 16);

        release.count_down();
        for thread in threads {
            thread.join().unwrap();
        }

        let deadline = Instant::now() + Duration::from_secs(2);
        let mut after = metrics.snapshot().threads;
        while after >= parked && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
            after = metrics.snapshot().threads;
        }
        assert!(after < parked, "snapshot keeps counting threads that already exited");
    }

    #[cfg(unix)]
    #[test]
    fn test_cpu_time_grows_under_load() {
        let before = cpu_time();

        let mut acc = 0u64;
        for i in 0..5_000_000u64 {
            acc = acc.wrapping_add(i).rotate_left(7);
        }
        assert!(acc != 42);

        assert!(cpu_time() >= before);
    }
}
