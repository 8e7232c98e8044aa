//! Creo Stats: live resource usage of running containers.
//!
//! This library streams per-container usage snapshots from the container runtime,
//! derives CPU, memory, block I/O, network and process metrics from them, and hands
//! them to a consumer through cancellable subscriptions.
use serde::Serialize;
use tokio::task::JoinSet;

use error::ResultOkLogExt;
use runtime::docker::DockerClient;
use stats::DerivedStats;

pub mod config;
pub mod container;
pub mod error;
pub mod monitor;
pub mod runtime;
pub mod stats;

/// Runs the Creo Stats application.
///
/// Subscribes to every container known to the daemon and prints each received
/// stats record as one JSON line on stdout until all streams have closed or
/// Ctrl-C is pressed.
///
/// # Errors
///
/// Possible errors include:
/// - Invalid configuration in the environment (see [`config`]).
/// - Failure to reach the docker daemon when listing containers.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::from_env()?;
    log::debug!("Using docker socket `{}`", config.socket_path.display());

    let client = DockerClient::new(&config.socket_path);
    let containers = client.list_containers().await?;
    log::debug!("Found {} containers", containers.len());
    let monitor = monitor::Monitor::new(client, config.sampler);

    let mut stop_handles = Vec::with_capacity(containers.len());
    let mut consumers = JoinSet::new();
    for container in containers {
        let (container, stats, stop) = monitor.subscribe(container).into_parts();
        let name = container.display_name().to_owned();
        match (stats, stop) {
            (Some(mut stats), Some(stop)) => {
                stop_handles.push(stop);
                consumers.spawn(async move {
                    while let Some(stats) = stats.recv().await {
                        print_stats(&name, &stats);
                    }
                    log::info!("Stats stream of container `{}` closed", name);
                });
            }
            _ => log::info!("Container `{}` is not running, no live data", name),
        }
    }

    if stop_handles.is_empty() {
        log::warn!("No running containers found");
        return Ok(());
    }

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            log::info!("Stopping {} stats sessions", stop_handles.len());
            for stop in &stop_handles {
                stop.stop();
            }
        }
        _ = async { while consumers.join_next().await.is_some() {} } => {}
    }
    while consumers.join_next().await.is_some() {}

    Ok(())
}

#[derive(Serialize)]
struct StatsLine<'a> {
    name: &'a str,
    #[serde(flatten)]
    stats: &'a DerivedStats,
}

fn print_stats(name: &str, stats: &DerivedStats) {
    if let Some(line) = serde_json::to_string(&StatsLine { name, stats }).ok_log(log::Level::Error)
    {
        println!("{line}");
    }
}
