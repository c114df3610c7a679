//! Verifiable storage client daemon: keeps a persistent WebSocket link to
//! the server and exposes an HTTP façade for upload/download/health.

use actix_web::{web, App, HttpServer};
use client::config::ClientConfig;
use client::connection::{self, LinkStatus};
use client::orchestrator::Orchestrator;
use client::store::ClientStore;
use client::{constants, facade};
use std::sync::Arc;
use tokio::sync::mpsc;
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
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ClientConfig::load();
    std::fs::create_dir_all(&config.data_dir)?;

    let store = ClientStore::open(&config.data_dir)?;
    let (outbound_tx, outbound_rx) = mpsc::channel(constants::OUTBOUND_QUEUE_CAPACITY);
    let orchestrator = Arc::new(Orchestrator::new(outbound_tx, store));
    let link = LinkStatus::default();

    let server_url = config.server_url();
    let connection_orchestrator = orchestrator.clone();
    let connection_link = link.clone();
    let link_task = tokio::spawn(async move {
        match connection::run(server_url, connection_orchestrator, outbound_rx, connection_link).await {
            Ok(()) => info!("connection manager shut down cleanly"),
            Err(e) => error!("connection manager gave up: {e}"),
        }
    });

    info!(listen = %config.listen, "starting HTTP façade");
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(facade::FacadeState {
                orchestrator: orchestrator.clone(),
                link: link.clone(),
            }))
            .service(facade::upload)
            .service(facade::download)
            .service(facade::health)
    })
    .bind(&config.listen)?
    .run()
    .await?;

    link_task.abort();
    Ok(())
}
