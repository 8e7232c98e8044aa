use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::container::ContainerID;
use crate::runtime::{ProcessList, Runtime};

/// Starts polling the process list of a container every `interval`, beginning
/// immediately. The latest result, `None` after a failed query, is published on
/// the returned receiver.
///
/// The poller stops when `cancel` fires or the receiver is dropped.
pub(super) fn spawn_poller<R: Runtime>(
    runtime: Arc<R>,
    container_id: ContainerID,
    interval: Duration,
    cancel: CancellationToken,
) -> watch::Receiver<Option<ProcessList>> {
    let (tx, rx) = watch::channel(None);
    tokio::spawn(poll(runtime, container_id, interval, cancel, tx));
    rx
}

/// A receiver that never carries a process list.
pub(super) fn disabled() -> watch::Receiver<Option<ProcessList>> {
    watch::channel(None).1
}

async fn poll<R: Runtime>(
    runtime: Arc<R>,
    container_id: ContainerID,
    interval: Duration,
    cancel: CancellationToken,
    tx: watch::Sender<Option<ProcessList>>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tx.closed() => break,
            _ = ticker.tick() => {}
        }

        let processes = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tx.closed() => break,
            res = runtime.top(&container_id) => match res {
                Ok(processes) => Some(processes),
                Err(err) => {
                    log::warn!(
                        "failed to list processes of container `{}`: {}",
                        container_id.short(),
                        err
                    );
                    None
                }
            },
        };
        tx.send_replace(processes);
    }

    log::trace!("process poller of container `{}` stopped", container_id.short());
}
