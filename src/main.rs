use std::path::PathBuf;

use anyhow::Context;
use soundboard_bridge::{apiserver::create_api_router, config::BridgeConfig, start_bridge};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let config = BridgeConfig::load(std::env::args_os().nth(1).map(PathBuf::from)).await?;
    let listen = config.listen;

    let handle = start_bridge(config);
    let router = create_api_router(&handle);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind panel API on {}", listen))?;
    log::info!("Panel API listening on {}", listen);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for Ctrl-C: {:?}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    log::info!("Shutting down.");
    handle.shutdown();
    Ok(())
}
