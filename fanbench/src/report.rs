use core::{
    fmt::{self, Display, Formatter},
    time::Duration,
};

use crate::metrics::Snapshot;

/// Outcome of one strategy run, derived purely from two snapshots and the
/// elapsed time. Immutable once built.
#[derive(Debug, Clone)]
pub struct Report {
    pub label: String,
    pub elapsed: Duration,
    /// Resident memory delta. Signed: it legitimately goes negative when
    /// the allocator returns memory between the snapshots.
    pub mem_delta: i64,
    pub cpu_delta: Duration,
    pub workers_before: usize,
    pub workers_after: usize,
}

impl Report {
    pub fn new(label: impl Into<String>, elapsed: Duration, before: &Snapshot, after: &Snapshot) -> Self {
        Self {
            label: label.into(),
            elapsed,
            mem_delta: after.mem_bytes as i64 - before.mem_bytes as i64,
            cpu_delta: after.cpu.saturating_sub(before.cpu),
            workers_before: before.threads,
            workers_after: after.threads,
        }
    }
}

impl Display for Report {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        writeln!(fmt, "Benchmarking: {}", self.label)?;
        writeln!(fmt, "  elapsed:  {} ms", self.elapsed.as_millis())?;
        writeln!(fmt, "  memory:   {}", format_bytes(self.mem_delta))?;
        writeln!(fmt, "  cpu time: {} ms (approx)", self.cpu_delta.as_millis())?;
        write!(fmt, "  threads:  {} -> {}", self.workers_before, self.workers_after)
    }
}

/// Formats a byte delta as whole megabytes when it is at least one megabyte
/// in magnitude, whole kilobytes otherwise. The sign is preserved.
pub fn format_bytes(bytes: i64) -> String {
    let kb = bytes / 1024;
    let mb = kb / 1024;

    if mb != 0 {
        format!("{mb} MB")
    } else {
        format!("{kb} KB")
    }
}
