/// Entry point for the Creo Stats container monitor.
///
/// Connects to the docker daemon, subscribes to the stats of every running
/// container and prints one JSON line per sample.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug CREO_SAMPLE_INTERVAL_MS=2000 cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    creo_stats::run().await
}
