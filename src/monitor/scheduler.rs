use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::container::ContainerRef;
use crate::runtime::{ByteStream, ProcessList, Runtime};
use crate::stats::{DecodeError, DerivedStats, RawSnapshot, SnapshotDecoder};

/// Why a stats session ended.
#[derive(Debug)]
enum StopReason {
    Cancelled,
    ConsumerGone,
    StreamEnded,
    Open(crate::runtime::Error),
    Decode(DecodeError),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("stopped"),
            Self::ConsumerGone => f.write_str("consumer went away"),
            Self::StreamEnded => f.write_str("runtime closed the stream"),
            Self::Open(err) => write!(f, "failed to open stats stream: {err}"),
            Self::Decode(err) => write!(f, "{err}"),
        }
    }
}

/// Body of the background task of one subscription.
///
/// Dropping `tx` on return closes the consumer's stream; the runtime stream is
/// owned by a local decoder and released on every return path.
pub(super) async fn run<R: Runtime>(
    runtime: Arc<R>,
    container: ContainerRef,
    tx: mpsc::Sender<DerivedStats>,
    cancel: CancellationToken,
    processes: watch::Receiver<Option<ProcessList>>,
    interval: Duration,
) {
    let id = container.id().short().to_owned();
    log::debug!("Starting stats session for container `{}`", id);

    let reason = sample(&*runtime, &container, &tx, &cancel, &processes, interval).await;
    match reason {
        StopReason::Open(_) | StopReason::Decode(_) => {
            log::warn!("Stats session for container `{}` ended: {}", id, reason)
        }
        _ => log::debug!("Stats session for container `{}` ended: {}", id, reason),
    }
}

async fn sample<R: Runtime>(
    runtime: &R,
    container: &ContainerRef,
    tx: &mpsc::Sender<DerivedStats>,
    cancel: &CancellationToken,
    processes: &watch::Receiver<Option<ProcessList>>,
    interval: Duration,
) -> StopReason {
    let stream = tokio::select! {
        biased;
        _ = cancel.cancelled() => return StopReason::Cancelled,
        res = runtime.stats_stream(container.id()) => match res {
            Ok(stream) => stream,
            Err(err) => return StopReason::Open(err),
        },
    };
    let mut decoder = SnapshotDecoder::new(stream);

    // The first snapshot of a session carries no previous CPU sample.
    if let Err(reason) = next_snapshot(&mut decoder, tx, cancel).await {
        return reason;
    }

    // Ticks that elapse during a slow decode are absorbed rather than replayed.
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return StopReason::Cancelled,
            _ = tx.closed() => return StopReason::ConsumerGone,
            _ = ticker.tick() => {}
        }

        let snapshot = match next_snapshot(&mut decoder, tx, cancel).await {
            Ok(snapshot) => snapshot,
            Err(reason) => return reason,
        };
        let stats = DerivedStats::new(container, &snapshot, processes.borrow().clone());
        log::trace!(
            "container `{}`: cpu={:.2}% mem={:.2}%",
            stats.container_id,
            stats.cpu_percentage,
            stats.memory_percentage
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return StopReason::Cancelled,
            delivered = hand_off(tx, stats) => {
                if !delivered {
                    return StopReason::ConsumerGone;
                }
            }
        }
    }
}

/// Pushes `stats` and waits until the consumer has received it. Returns
/// `false` if the consumer went away first.
async fn hand_off(tx: &mpsc::Sender<DerivedStats>, stats: DerivedStats) -> bool {
    if tx.send(stats).await.is_err() {
        return false;
    }
    // The single slot frees up only once the record has been taken.
    tx.reserve().await.is_ok()
}

async fn next_snapshot<S: ByteStream>(
    decoder: &mut SnapshotDecoder<S>,
    tx: &mpsc::Sender<DerivedStats>,
    cancel: &CancellationToken,
) -> Result<RawSnapshot, StopReason> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StopReason::Cancelled),
        _ = tx.closed() => Err(StopReason::ConsumerGone),
        res = decoder.decode() => res.map_err(|err| {
            if err.is_end_of_stream() {
                StopReason::StreamEnded
            } else {
                StopReason::Decode(err)
            }
        }),
    }
}
