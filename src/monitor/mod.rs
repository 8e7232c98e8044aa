//! Live per-container stats sessions.
//!
//! [`Monitor::subscribe`] turns a [`ContainerRef`] into a [`Subscription`]. For
//! a running container this spawns one background task that opens a stats
//! stream on the runtime, decodes a snapshot on every tick of the sampling
//! interval, derives [`DerivedStats`](crate::stats::DerivedStats) from it and
//! hands each record to the consumer, waiting until it has been received before
//! sampling again, so a slow consumer slows sampling down.
//!
//! Each subscription owns one [`CancellationToken`]. Stopping it interrupts the
//! task wherever it is waiting, including inside a decode that is blocked on
//! the runtime, and the task then drops the runtime stream, which closes the
//! connection. Subscriptions never share state: two subscriptions of the same
//! container open two independent runtime sessions.

mod process;
mod scheduler;
mod subscription;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::SamplerConfig;
use crate::container::ContainerRef;
use crate::runtime::Runtime;

pub use subscription::{StopHandle, Subscription};

#[derive(Debug)]
pub struct Monitor<R> {
    runtime: Arc<R>,
    config: SamplerConfig,
}

impl<R: Runtime> Monitor<R> {
    pub fn new(runtime: R, config: SamplerConfig) -> Self {
        Self {
            runtime: Arc::new(runtime),
            config,
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Subscribes to the stats of `container`.
    ///
    /// A container that is not running yields an inert subscription without a
    /// stream or stop handle, and no task is started for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(&self, container: ContainerRef) -> Subscription {
        if !container.is_running() {
            log::debug!(
                "Container `{}` is not running, no stats session started",
                container.id().short()
            );
            return Subscription::inert(container);
        }

        let (tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let processes = match self.config.process_interval {
            Some(interval) => process::spawn_poller(
                Arc::clone(&self.runtime),
                container.id().clone(),
                interval,
                cancel.clone(),
            ),
            None => process::disabled(),
        };
        let task = tokio::spawn(scheduler::run(
            Arc::clone(&self.runtime),
            container.clone(),
            tx,
            cancel.clone(),
            processes,
            self.config.sample_interval,
        ));

        Subscription::live(container, rx, StopHandle::new(cancel), task)
    }
}
