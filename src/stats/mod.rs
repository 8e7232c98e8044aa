//! Container usage snapshots and the metrics derived from them.
//!
//! The runtime reports usage as a continuous stream of JSON documents. This
//! module turns that stream into structured data and display-ready values.
//!
//! # Main types
//!
//! - [`SnapshotDecoder`]: pulls one [`RawSnapshot`] at a time out of a runtime
//!   [`ByteStream`](crate::runtime::ByteStream).
//! - [`RawSnapshot`]: one decoded point-in-time usage record, carrying both the
//!   current and the previous CPU sample.
//! - [`DerivedStats`]: percentages and byte totals computed from a snapshot by
//!   the pure functions in [`calc`].

pub mod calc;
mod decoder;
mod derived;
mod error;
mod snapshot;

pub use decoder::{MAX_PENDING_BYTES, SnapshotDecoder};
pub use derived::DerivedStats;
pub use error::DecodeError;
pub use snapshot::{
    BlkioEntry, BlkioStats, CpuStats, CpuUsage, MemoryStats, NetworkStats, PidsStats, RawSnapshot,
};
