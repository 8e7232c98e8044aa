//! Incremental decoding of the docker stats stream.
//!
//! The daemon writes one JSON document per sample, but transport chunks do not
//! line up with documents: a chunk may carry half a snapshot or several of them.
//! [`SnapshotDecoder`] buffers raw bytes and hands out exactly one
//! [`RawSnapshot`] per [`decode`](SnapshotDecoder::decode) call, pulling more
//! bytes from the underlying [`ByteStream`] only when the buffer does not hold a
//! complete document.

use crate::runtime::ByteStream;

use super::error::DecodeError;
use super::snapshot::RawSnapshot;

/// Upper bound on buffered bytes of a single unfinished snapshot. Real
/// snapshots are a few KiB; a stream that exceeds this is not producing them.
pub const MAX_PENDING_BYTES: usize = 1 << 20;

#[derive(Debug)]
pub struct SnapshotDecoder<S> {
    source: S,
    buf: Vec<u8>,
}

impl<S: ByteStream> SnapshotDecoder<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            buf: Vec::with_capacity(4096),
        }
    }

    /// Waits for and returns the next snapshot of the stream.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::EndOfStream`] if the stream closed between two snapshots.
    /// - [`DecodeError::Truncated`] if it closed in the middle of one.
    /// - [`DecodeError::Json`] if the buffered bytes are not a valid snapshot.
    /// - [`DecodeError::Oversized`] if a snapshot grows past [`MAX_PENDING_BYTES`].
    /// - [`DecodeError::Runtime`] if reading from the runtime failed.
    ///
    /// The decoder must not be used again after an error.
    pub async fn decode(&mut self) -> Result<RawSnapshot, DecodeError> {
        loop {
            if let Some(snapshot) = self.take_buffered()? {
                return Ok(snapshot);
            }
            if self.buf.len() > MAX_PENDING_BYTES {
                return Err(DecodeError::Oversized {
                    pending: self.buf.len(),
                });
            }

            match self.source.next_chunk().await? {
                Some(chunk) => self.buf.extend_from_slice(&chunk),
                None if self.buf.is_empty() => return Err(DecodeError::EndOfStream),
                None => {
                    return Err(DecodeError::Truncated {
                        pending: self.buf.len(),
                    });
                }
            }
        }
    }

    /// Parses one snapshot from the front of the buffer, if a complete one is there.
    fn take_buffered(&mut self) -> Result<Option<RawSnapshot>, DecodeError> {
        let start = self
            .buf
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(self.buf.len());
        self.buf.drain(..start);
        if self.buf.is_empty() {
            return Ok(None);
        }

        let parsed = {
            let mut values =
                serde_json::Deserializer::from_slice(&self.buf).into_iter::<RawSnapshot>();
            values
                .next()
                .map(|res| res.map(|snapshot| (snapshot, values.byte_offset())))
        };

        match parsed {
            Some(Ok((snapshot, consumed))) => {
                self.buf.drain(..consumed);
                Ok(Some(snapshot))
            }
            Some(Err(err)) if err.is_eof() => Ok(None),
            Some(Err(err)) => Err(DecodeError::Json(err)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use bytes::Bytes;

    use super::*;

    struct Chunks(VecDeque<crate::runtime::Result<Bytes>>);

    impl Chunks {
        fn new<'a>(chunks: impl IntoIterator<Item = &'a str>) -> Self {
            Self(
                chunks
                    .into_iter()
                    .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
                    .collect(),
            )
        }
    }

    impl ByteStream for Chunks {
        async fn next_chunk(&mut self) -> crate::runtime::Result<Option<Bytes>> {
            self.0.pop_front().transpose()
        }
    }

    const FIRST: &str = r#"{"memory_stats":{"usage":1,"limit":10},"pids_stats":{"current":1}}"#;
    const SECOND: &str = r#"{"memory_stats":{"usage":2,"limit":10},"pids_stats":{"current":2}}"#;

    #[tokio::test]
    async fn test_decode_one_snapshot_per_line() {
        let first = format!("{FIRST}\n");
        let second = format!("{SECOND}\n");
        let mut decoder = SnapshotDecoder::new(Chunks::new([first.as_str(), second.as_str()]));

        assert_eq!(decoder.decode().await.unwrap().pids_stats.current, 1);
        assert_eq!(decoder.decode().await.unwrap().pids_stats.current, 2);
        assert!(decoder.decode().await.unwrap_err().is_end_of_stream());
    }

    #[tokio::test]
    async fn test_decode_snapshot_split_across_chunks() {
        let (head, tail) = SECOND.split_at(17);
        let mut decoder = SnapshotDecoder::new(Chunks::new([head, "", tail, "\n"]));

        let snapshot = decoder.decode().await.unwrap();
        assert_eq!(snapshot.memory_stats.usage, 2);
        assert!(decoder.decode().await.unwrap_err().is_end_of_stream());
    }

    #[tokio::test]
    async fn test_decode_several_snapshots_in_one_chunk() {
        let joined = format!("{FIRST}\n{SECOND}\n");
        let mut decoder = SnapshotDecoder::new(Chunks::new([joined.as_str()]));

        assert_eq!(decoder.decode().await.unwrap().memory_stats.usage, 1);
        assert_eq!(decoder.decode().await.unwrap().memory_stats.usage, 2);
        assert!(decoder.decode().await.unwrap_err().is_end_of_stream());
    }

    #[tokio::test]
    async fn test_decode_truncated_stream() {
        let mut decoder = SnapshotDecoder::new(Chunks::new([&FIRST[..20]]));

        match decoder.decode().await.unwrap_err() {
            DecodeError::Truncated { pending } => assert_eq!(pending, 20),
            err => panic!("Expected Truncated error, got {err}"),
        }
    }

    #[tokio::test]
    async fn test_decode_unfinished_snapshot_is_bounded() {
        let head = r#"{"networks":{"eth0":{"name":""#;
        let filler = "x".repeat(MAX_PENDING_BYTES);
        let mut decoder = SnapshotDecoder::new(Chunks::new([head, filler.as_str(), "\"}}}\n"]));

        match decoder.decode().await.unwrap_err() {
            DecodeError::Oversized { pending } => {
                assert_eq!(pending, head.len() + MAX_PENDING_BYTES)
            }
            err => panic!("Expected Oversized error, got {err}"),
        }
    }

    #[tokio::test]
    async fn test_decode_malformed_snapshot() {
        let mut decoder =
            SnapshotDecoder::new(Chunks::new([r#"{"memory_stats":{"usage":"lots"}}"#, "\n"]));

        assert!(matches!(
            decoder.decode().await.unwrap_err(),
            DecodeError::Json(_)
        ));
    }

    #[tokio::test]
    async fn test_decode_runtime_error() {
        let mut decoder = SnapshotDecoder::new(Chunks(VecDeque::from([Err(
            crate::runtime::Error::Status {
                path: "/containers/abc/stats".to_owned(),
                status: 500,
                message: "boom".to_owned(),
            },
        )])));

        assert!(matches!(
            decoder.decode().await.unwrap_err(),
            DecodeError::Runtime(_)
        ));
    }
}
