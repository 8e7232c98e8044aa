//! The container runtime as seen by the stats pipeline.
//!
//! The pipeline needs exactly two things from a runtime: a live byte stream of
//! usage snapshots for a container, and a best-effort list of the processes
//! running inside it. [`Runtime`] captures that seam; [`docker::DockerClient`]
//! implements it against the Docker Engine API.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::container::ContainerID;

pub mod docker;
mod error;

pub use error::{Error, Result};

/// A source of raw bytes belonging to one streaming session.
///
/// Dropping the stream must release the underlying connection.
pub trait ByteStream: Send {
    /// Waits for the next chunk of bytes. `Ok(None)` signals that the runtime
    /// closed the session.
    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Bytes>>> + Send;
}

pub trait Runtime: Send + Sync + 'static {
    type Stream: ByteStream + 'static;

    /// Opens a new streaming stats session for the given container.
    fn stats_stream(
        &self,
        container_id: &ContainerID,
    ) -> impl Future<Output = Result<Self::Stream>> + Send;

    /// Lists the processes currently running in the given container.
    fn top(&self, container_id: &ContainerID) -> impl Future<Output = Result<ProcessList>> + Send;
}

/// Output of `ps` inside a container: column titles and one row per process.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessList {
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(default)]
    pub processes: Vec<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_list_from_top_response() {
        let list: ProcessList = serde_json::from_str(
            r#"{"Titles":["UID","PID","CMD"],"Processes":[["root","1","sh"],["root","42","sleep 60"]]}"#,
        )
        .unwrap();

        assert_eq!(list.titles, vec!["UID", "PID", "CMD"]);
        assert_eq!(list.processes[1][1], "42");

        let empty: ProcessList = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ProcessList::default());
    }
}
