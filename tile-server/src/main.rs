use anyhow::{anyhow, Context};
use std::sync::Arc;
use tracing::{error, info};

use tileworld_core::logging::{init_tracing, TracingConfig};
use tileworld_server::{api, spawn_generation, AppState, ServerConfig, ServerMetrics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("Invalid configuration")?;
    init_tracing(&TracingConfig::default().with_default_level(config.log_level));

    info!("🚀 Starting Tile World Server...");
    info!(
        width = config.world.width,
        height = config.world.height,
        seed = config.world.seed,
        outbound_buffer = config.outbound_buffer,
        "Configuration loaded"
    );

    // ========================================================================
    // 1. Generate the world off the accept loop
    // ========================================================================
    let metrics = ServerMetrics::new();
    let (gate, generation) = spawn_generation(config.world, metrics.clone());

    // ========================================================================
    // 2. Serve immediately; early clients wait on the gate
    // ========================================================================
    let state = AppState {
        gate,
        metrics,
        config: Arc::new(config),
    };
    let server = api::start_server(state, shutdown_signal());

    // A failed generation leaves nothing to serve
    let generation = async {
        match generation.await {
            Ok(Ok(())) => std::future::pending::<anyhow::Result<()>>().await,
            Ok(Err(e)) => Err(anyhow!(e).context("World generation failed")),
            Err(e) => Err(anyhow!(e).context("World generation panicked")),
        }
    };

    tokio::select! {
        result = server => result.context("Server error")?,
        result = generation => {
            if let Err(e) = &result {
                error!("{:#}", e);
            }
            result?
        }
    }

    info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutdown requested");
}
