use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::container::ContainerRef;
use crate::stats::DerivedStats;

/// Requests the end of a live subscription. Cheap to clone; stopping twice is a no-op.
#[derive(Debug, Clone)]
pub struct StopHandle(CancellationToken);

impl StopHandle {
    pub(super) fn new(token: CancellationToken) -> Self {
        Self(token)
    }

    pub fn stop(&self) {
        self.0.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// A live stats session of one container, or an inert placeholder for a
/// container that was not running when subscribed.
///
/// The stats stream closes when the session ends for any reason: stopped,
/// runtime stream ended, decode error. Closure is the only termination signal.
/// Dropping the subscription stops the session.
#[derive(Debug)]
pub struct Subscription {
    container: ContainerRef,
    stats: Option<mpsc::Receiver<DerivedStats>>,
    stop: Option<StopHandle>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(super) fn inert(container: ContainerRef) -> Self {
        Self {
            container,
            stats: None,
            stop: None,
            task: None,
        }
    }

    pub(super) fn live(
        container: ContainerRef,
        stats: mpsc::Receiver<DerivedStats>,
        stop: StopHandle,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            container,
            stats: Some(stats),
            stop: Some(stop),
            task: Some(task),
        }
    }

    pub fn container(&self) -> &ContainerRef {
        &self.container
    }

    /// Returns `false` for subscriptions of containers that were not running.
    pub fn is_live(&self) -> bool {
        self.stats.is_some()
    }

    /// Waits for the next stats record. Returns `None` once the stream is closed,
    /// and immediately for inert subscriptions.
    pub async fn next(&mut self) -> Option<DerivedStats> {
        match self.stats.as_mut() {
            Some(stats) => stats.recv().await,
            None => None,
        }
    }

    pub fn stop_handle(&self) -> Option<StopHandle> {
        self.stop.clone()
    }

    pub fn stop(&self) {
        if let Some(stop) = &self.stop {
            stop.stop();
        }
    }

    /// Stops the session and waits until the background task has released its
    /// runtime session.
    pub async fn join(mut self) {
        self.stop();
        self.stats.take();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                log::error!(
                    "stats task of container `{}` failed: {}",
                    self.container.id().short(),
                    err
                );
            }
        }
    }

    /// Splits the subscription so the stream can be consumed on another task.
    ///
    /// The background task keeps running until the stream is dropped or closed,
    /// or the stop handle is used.
    pub fn into_parts(
        mut self,
    ) -> (
        ContainerRef,
        Option<mpsc::Receiver<DerivedStats>>,
        Option<StopHandle>,
    ) {
        self.task.take();
        (self.container.clone(), self.stats.take(), self.stop.take())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}
