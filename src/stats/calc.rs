//! Pure functions deriving percentages and byte totals from [`RawSnapshot`]s.
//!
//! None of these functions keep state or perform I/O; every snapshot carries both
//! the current and the previous CPU sample, so a single snapshot is enough to
//! compute all derived values.

use std::collections::HashMap;

use super::snapshot::{BlkioStats, CpuStats, MemoryStats, NetworkStats, RawSnapshot};

/// Returns the CPU usage of the container in percent of one core, i.e. a fully
/// busy container with two cores reports `200.0`.
pub fn cpu_percent(snapshot: &RawSnapshot) -> f64 {
    cpu_percent_between(&snapshot.cpu_stats, &snapshot.precpu_stats)
}

/// Computes the CPU percentage between two CPU samples.
///
/// Returns `0.0` unless both the container delta and the system delta are
/// strictly positive. A counter that went backwards counts as a non-positive
/// delta.
pub fn cpu_percent_between(current: &CpuStats, previous: &CpuStats) -> f64 {
    let cpu_delta = current
        .cpu_usage
        .total_usage
        .saturating_sub(previous.cpu_usage.total_usage);
    let system_delta = current
        .system_cpu_usage
        .saturating_sub(previous.system_cpu_usage);

    if cpu_delta == 0 || system_delta == 0 {
        return 0.0;
    }

    (cpu_delta as f64 / system_delta as f64) * core_count(current) as f64 * 100.0
}

/// Number of cores the usage is spread over: the length of the per-core list,
/// or `online_cpus` when the daemon does not report per-core counters.
fn core_count(stats: &CpuStats) -> usize {
    match stats.cpu_usage.percpu_usage.len() {
        0 => stats.online_cpus as usize,
        n => n,
    }
}

/// Returns `usage / limit * 100`, or `0.0` when no limit is known.
pub fn memory_percent(memory: &MemoryStats) -> f64 {
    if memory.limit == 0 {
        return 0.0;
    }
    memory.usage as f64 / memory.limit as f64 * 100.0
}

/// Sums block I/O bytes into `(read, write)`.
///
/// Operation labels are matched case-insensitively; entries with other labels
/// (`Sync`, `Async`, `Total`, ...) are ignored.
pub fn block_io(blkio: &BlkioStats) -> (u64, u64) {
    blkio
        .io_service_bytes_recursive
        .iter()
        .fold((0, 0), |(read, write), entry| {
            if entry.op.eq_ignore_ascii_case("read") {
                (read.saturating_add(entry.value), write)
            } else if entry.op.eq_ignore_ascii_case("write") {
                (read, write.saturating_add(entry.value))
            } else {
                (read, write)
            }
        })
}

/// Sums received and transmitted bytes over all interfaces into `(rx, tx)`.
pub fn network(networks: &HashMap<String, NetworkStats>) -> (u64, u64) {
    networks.values().fold((0, 0), |(rx, tx), iface| {
        (
            rx.saturating_add(iface.rx_bytes),
            tx.saturating_add(iface.tx_bytes),
        )
    })
}
