//! kinelink-bridge: run the pose bridge on the default port

use kinelink_runtime::{BridgeRuntime, RuntimeConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut runtime = BridgeRuntime::start(RuntimeConfig::default()).await?;
    tracing::info!(addr = %runtime.local_addr(), "kinelink bridge running");

    tokio::select! {
        _ = runtime.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received");
        }
    }

    runtime.shutdown();
    Ok(())
}
