//! Drives the client's HTTP façade itself (not just the orchestrator), the
//! way a real end user would: multipart upload, JSON download, health probe.

use actix_web::{web, App, HttpServer};
use client::connection::{self as client_connection, LinkStatus};
use client::orchestrator::Orchestrator;
use client::store::ClientStore;
use client::{constants, facade};
use server::connection as server_connection;
use server::state::ServerState;
use std::sync::Arc;
use storage::{BlobStore, SledTreeStore};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

async fn spawn_stack() -> (String, tempfile::TempDir, tempfile::TempDir) {
    let server_data = tempfile::tempdir().unwrap();
    let client_data = tempfile::tempdir().unwrap();

    let store = SledTreeStore::open(server_data.path().join("trees")).unwrap();
    let blobs = BlobStore::new(server_data.path().join("blobs"));
    let state = Arc::new(ServerState::new(Arc::new(store), Arc::new(blobs)));

    let server_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server_addr = server_listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (stream, peer) = match server_listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => return,
            };
            tokio::spawn(server_connection::handle_connection(stream, peer, state.clone()));
        }
    });

    let client_store = ClientStore::open(client_data.path()).unwrap();
    let (outbound_tx, outbound_rx) = mpsc::channel(constants::OUTBOUND_QUEUE_CAPACITY);
    let orchestrator = Arc::new(Orchestrator::new(outbound_tx, client_store));
    let link = LinkStatus::default();

    let url = format!("ws://{server_addr}/");
    let connection_orchestrator = orchestrator.clone();
    let connection_link = link.clone();
    tokio::spawn(async move {
        let _ = client_connection::run(url, connection_orchestrator, outbound_rx, connection_link).await;
    });

    let facade_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let facade_addr = facade_listener.local_addr().unwrap();
    tokio::spawn(
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
        .listen(facade_listener.into_std().unwrap())
        .unwrap()
        .run(),
    );

    tokio::time::sleep(std::time::Duration::from_millis(300)).await;

    (format!("http://{facade_addr}"), server_data, client_data)
}

#[tokio::test]
async fn health_reports_ok_once_the_link_is_up() {
    let (base_url, _server_data, _client_data) = spawn_stack().await;

    let response = reqwest::get(format!("{base_url}/health")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn upload_then_download_through_http() {
    let (base_url, _server_data, _client_data) = spawn_stack().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new()
        .text("filename", "greeting.txt")
        .part(
            "file",
            reqwest::multipart::Part::bytes(b"hello http".to_vec()).file_name("greeting.txt"),
        );

    let upload_response = client
        .post(format!("{base_url}/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(upload_response.status(), 200);
    let body: serde_json::Value = upload_response.json().await.unwrap();
    let receipt_id = body["receiptId"].as_str().unwrap().to_string();
    assert!(!receipt_id.is_empty());

    let download_response = client
        .post(format!("{base_url}/download"))
        .json(&serde_json::json!({ "receipt_id": receipt_id, "filename": "greeting.txt" }))
        .send()
        .await
        .unwrap();
    assert_eq!(download_response.status(), 200);
    assert_eq!(
        download_response.headers().get("proof-root-hash").unwrap(),
        receipt_id.as_str()
    );
    assert!(download_response.headers().contains_key("proof-sibling-0-left")
        || download_response.headers().contains_key("proof-sibling-0-right"));
    let bytes = download_response.bytes().await.unwrap();
    assert_eq!(bytes.as_ref(), b"hello http");
}
