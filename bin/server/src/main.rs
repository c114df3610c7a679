//! Verifiable storage server

use anyhow::{Context, Result};
use server::config::ServerConfig;
use server::state::ServerState;
use std::sync::Arc;
use storage::{BlobStore, SledTreeStore};
use tokio::net::TcpListener;
use tracing::{error, info};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = ServerConfig::load();
    std::fs::create_dir_all(config.blob_dir()).context("failed to create blob directory")?;
    std::fs::create_dir_all(config.tree_db_dir()).context("failed to create tree store directory")?;

    let store = SledTreeStore::open(config.tree_db_dir()).context("failed to open tree store")?;
    let blobs = BlobStore::new(config.blob_dir());
    let state = Arc::new(ServerState::new(Arc::new(store), Arc::new(blobs)));

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!("listening on ws://{}/", config.bind_address());

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("accept failed: {e}");
                continue;
            }
        };
        let state = state.clone();
        tokio::spawn(server::connection::handle_connection(stream, peer, state));
    }
}
