#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("stats stream ended")]
    EndOfStream,
    #[error("stats stream ended inside a snapshot ({pending} bytes pending)")]
    Truncated { pending: usize },
    #[error("stats snapshot exceeds {limit} bytes ({pending} bytes pending)", limit = super::decoder::MAX_PENDING_BYTES)]
    Oversized { pending: usize },
    #[error("malformed stats snapshot: {0}")]
    Json(#[source] serde_json::Error),
    #[error("failed to read stats stream: {0}")]
    Runtime(#[from] crate::runtime::Error),
}

impl DecodeError {
    /// Returns `true` if the stream closed cleanly between two snapshots.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}
