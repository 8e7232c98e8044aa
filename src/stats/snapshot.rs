//! Wire types for one sample of the docker stats stream.
//!
//! Only the fields needed to derive [`DerivedStats`](super::DerivedStats) are
//! decoded; everything else in the payload is ignored. Collections the daemon
//! reports as `null` or omits entirely (e.g. `percpu_usage` on cgroup v2 hosts,
//! `networks` for containers with `--network none`) decode as empty.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// A single point-in-time usage record of a container.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RawSnapshot {
    /// CPU counters of this sample.
    #[serde(default)]
    pub cpu_stats: CpuStats,
    /// CPU counters of the sample immediately before this one.
    #[serde(default)]
    pub precpu_stats: CpuStats,
    #[serde(default)]
    pub memory_stats: MemoryStats,
    #[serde(default)]
    pub blkio_stats: BlkioStats,
    /// Per-interface network counters, keyed by interface name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub networks: HashMap<String, NetworkStats>,
    #[serde(default)]
    pub pids_stats: PidsStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct CpuStats {
    #[serde(default)]
    pub cpu_usage: CpuUsage,
    /// Host-wide CPU usage counter in nanoseconds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub system_cpu_usage: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub online_cpus: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct CpuUsage {
    /// Total CPU time consumed by the container in nanoseconds.
    #[serde(default)]
    pub total_usage: u64,
    /// CPU time consumed per core. One entry per core the container may run on.
    #[serde(default, deserialize_with = "null_as_default")]
    pub percpu_usage: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct MemoryStats {
    #[serde(default)]
    pub usage: u64,
    #[serde(default)]
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct BlkioStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub io_service_bytes_recursive: Vec<BlkioEntry>,
}

/// One block device counter, e.g. `{"major":8,"minor":0,"op":"Read","value":4096}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct BlkioEntry {
    #[serde(default)]
    pub op: String,
    #[serde(default)]
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct NetworkStats {
    #[serde(default)]
    pub rx_bytes: u64,
    #[serde(default)]
    pub tx_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PidsStats {
    #[serde(default)]
    pub current: u64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
