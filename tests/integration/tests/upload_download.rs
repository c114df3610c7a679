//! In-process end-to-end coverage: a real server accept loop plus a real
//! client connection manager and orchestrator, talking over an actual
//! WebSocket on localhost.

use client::connection::{self as client_connection, LinkStatus};
use client::orchestrator::{Orchestrator, OrchestratorError};
use client::store::ClientStore;
use merkle_tree::HashAlgorithm;
use server::connection as server_connection;
use server::state::ServerState;
use std::sync::Arc;
use storage::{BlobStore, SledTreeStore};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

struct Harness {
    orchestrator: Arc<Orchestrator>,
    _server_data: tempfile::TempDir,
    _client_data: tempfile::TempDir,
}

async fn spawn_harness() -> Harness {
    let server_data = tempfile::tempdir().unwrap();
    let client_data = tempfile::tempdir().unwrap();

    let store = SledTreeStore::open(server_data.path().join("trees")).unwrap();
    let blobs = BlobStore::new(server_data.path().join("blobs"));
    let state = Arc::new(ServerState::new(Arc::new(store), Arc::new(blobs)));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => return,
            };
            tokio::spawn(server_connection::handle_connection(stream, peer, state.clone()));
        }
    });

    let client_store = ClientStore::open(client_data.path()).unwrap();
    let (outbound_tx, outbound_rx) = mpsc::channel(100);
    let orchestrator = Arc::new(Orchestrator::new(outbound_tx, client_store));
    let link = LinkStatus::default();

    let url = format!("ws://{addr}/");
    let connection_orchestrator = orchestrator.clone();
    tokio::spawn(async move {
        let _ = client_connection::run(url, connection_orchestrator, outbound_rx, link).await;
    });

    // give the connection manager a moment to complete the handshake.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    Harness {
        orchestrator,
        _server_data: server_data,
        _client_data: client_data,
    }
}

fn batch(files: &[(&str, &[u8])]) -> Vec<(String, Vec<u8>)> {
    files
        .iter()
        .map(|(name, contents)| (name.to_string(), contents.to_vec()))
        .collect()
}

#[tokio::test]
async fn upload_then_download_round_trips_and_verifies() {
    let harness = spawn_harness().await;

    let files = batch(&[("a.txt", b"hello"), ("b.txt", b"world")]);
    let receipt_id = harness
        .orchestrator
        .upload(files, HashAlgorithm::Sha512)
        .await
        .expect("upload should succeed");
    assert!(!receipt_id.is_empty());

    let (contents, proof) = harness
        .orchestrator
        .download(&receipt_id, "a.txt")
        .await
        .expect("download should succeed");

    assert_eq!(contents, b"hello");
    assert!(!proof.is_empty());
}

#[tokio::test]
async fn every_file_in_a_batch_downloads_and_verifies() {
    let harness = spawn_harness().await;

    let files = batch(&[("one", b"1"), ("two", b"2"), ("three", b"3")]);
    let receipt_id = harness
        .orchestrator
        .upload(files, HashAlgorithm::Sha256)
        .await
        .unwrap();

    for (name, expected) in [("one", b"1"), ("two", b"2"), ("three", b"3")] {
        let (contents, _) = harness.orchestrator.download(&receipt_id, name).await.unwrap();
        assert_eq!(contents, expected);
    }
}

#[tokio::test]
async fn unknown_filename_is_rejected_by_the_server() {
    let harness = spawn_harness().await;

    let files = batch(&[("only", b"data")]);
    let receipt_id = harness.orchestrator.upload(files, HashAlgorithm::Sha512).await.unwrap();

    let err = harness
        .orchestrator
        .download(&receipt_id, "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::FileNotFound(_)));
}

#[tokio::test]
async fn unknown_receipt_is_rejected_locally() {
    let harness = spawn_harness().await;
    let err = harness
        .orchestrator
        .download("no-such-receipt", "a.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::UnknownReceipt));
}

#[tokio::test]
async fn empty_batch_is_rejected_before_any_frame_is_sent() {
    let harness = spawn_harness().await;
    let err = harness.orchestrator.upload(vec![], HashAlgorithm::Sha512).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::BuildFailed(_)));
}

#[tokio::test]
async fn reuploading_the_same_batch_is_rejected_as_a_duplicate() {
    let harness = spawn_harness().await;
    let files = batch(&[("dup.txt", b"same contents")]);

    let first = harness.orchestrator.upload(files.clone(), HashAlgorithm::Sha512).await.unwrap();

    let err = harness.orchestrator.upload(files, HashAlgorithm::Sha512).await.unwrap_err();
    match err {
        OrchestratorError::Rejected(message) => assert!(message.contains(&first)),
        other => panic!("expected a Rejected dedup error, got {other:?}"),
    }
}
