use serde::Serialize;

use crate::container::ContainerRef;
use crate::runtime::ProcessList;

use super::calc;
use super::snapshot::RawSnapshot;

/// Display-ready metrics of one container, derived from a single [`RawSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedStats {
    /// Truncated container id.
    pub container_id: String,
    pub command: String,
    pub cpu_percentage: f64,
    /// Memory in use, in bytes.
    pub memory: u64,
    /// Memory limit in bytes, `0` if unknown.
    pub memory_limit: u64,
    pub memory_percentage: f64,
    pub block_read: u64,
    pub block_write: u64,
    pub network_rx: u64,
    pub network_tx: u64,
    pub pids_current: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_list: Option<ProcessList>,
}

impl DerivedStats {
    pub fn new(
        container: &ContainerRef,
        snapshot: &RawSnapshot,
        process_list: Option<ProcessList>,
    ) -> Self {
        let (block_read, block_write) = calc::block_io(&snapshot.blkio_stats);
        let (network_rx, network_tx) = calc::network(&snapshot.networks);

        Self {
            container_id: container.id().short().to_owned(),
            command: container.command().to_owned(),
            cpu_percentage: calc::cpu_percent(snapshot),
            memory: snapshot.memory_stats.usage,
            memory_limit: snapshot.memory_stats.limit,
            memory_percentage: calc::memory_percent(&snapshot.memory_stats),
            block_read,
            block_write,
            network_rx,
            network_tx,
            pids_current: snapshot.pids_stats.current,
            process_list,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerID;

    #[test]
    fn test_derive_from_snapshot() {
        let container = ContainerRef::new(
            ContainerID::new("0123456789abcdef0123456789abcdef").unwrap(),
            vec!["/db".to_owned()],
            "postgres -c fsync=off".to_owned(),
            true,
        );
        let snapshot: RawSnapshot = serde_json::from_str(
            r#"{
                "cpu_stats": {"cpu_usage": {"total_usage": 200, "percpu_usage": [1, 1]}, "system_cpu_usage": 1000},
                "precpu_stats": {"cpu_usage": {"total_usage": 100}, "system_cpu_usage": 800},
                "memory_stats": {"usage": 0, "limit": 0},
                "blkio_stats": {"io_service_bytes_recursive": [
                    {"op": "Read", "value": 10}, {"op": "WRITE", "value": 5}, {"op": "Sync", "value": 1}
                ]},
                "networks": {"eth0": {"rx_bytes": 100, "tx_bytes": 50}, "eth1": {"rx_bytes": 20, "tx_bytes": 10}},
                "pids_stats": {"current": 3}
            }"#,
        )
        .unwrap();

        let stats = DerivedStats::new(&container, &snapshot, None);
        assert_eq!(stats.container_id, "0123456789ab");
        assert_eq!(stats.command, "postgres -c fsync=off");
        assert!((stats.cpu_percentage - 100.0).abs() < 1e-9);
        assert_eq!(stats.memory_percentage, 0.0);
        assert_eq!((stats.block_read, stats.block_write), (10, 5));
        assert_eq!((stats.network_rx, stats.network_tx), (120, 60));
        assert_eq!(stats.pids_current, 3);
        assert!(stats.process_list.is_none());
    }

    #[test]
    fn test_serialize_skips_missing_process_list() {
        let container = ContainerRef::new(
            ContainerID::new("abc").unwrap(),
            Vec::new(),
            "sh".to_owned(),
            true,
        );
        let stats = DerivedStats::new(&container, &RawSnapshot::default(), None);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["container_id"], "abc");
        assert!(json.get("process_list").is_none());

        let processes = ProcessList {
            titles: vec!["PID".to_owned(), "CMD".to_owned()],
            processes: vec![vec!["1".to_owned(), "sh".to_owned()]],
        };
        let stats = DerivedStats::new(&container, &RawSnapshot::default(), Some(processes));
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["process_list"]["Titles"][0], "PID");
    }
}
