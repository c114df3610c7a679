use crate::constants::OUTBOUND_QUEUE_CAPACITY;
use crate::proof_server::handle_download;
use crate::receiver::{process_batch, BatchReceiver, PreflightOutcome};
use crate::state::ServerState;
use futures_util::{SinkExt, StreamExt};
use protocol::{AckResult, Message as WireMessage, Wrapper};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

async fn send(tx: &mpsc::Sender<WsMessage>, wrapper: Wrapper) {
    match wrapper.encode() {
        Ok(bytes) => {
            if tx.send(WsMessage::Binary(bytes)).await.is_err() {
                tracing::warn!("outbound queue closed, dropping reply");
            }
        }
        Err(e) => tracing::error!("failed to encode reply: {e}"),
    }
}

pub async fn handle_connection(stream: TcpStream, peer: SocketAddr, state: Arc<ServerState>) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!(%peer, "websocket handshake failed: {e}");
            return;
        }
    };
    tracing::info!(%peer, "client connected");

    let (mut sink, mut incoming) = ws_stream.split();
    let (tx, mut rx) = mpsc::channel::<WsMessage>(OUTBOUND_QUEUE_CAPACITY);

    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
        let _ = sink.send(WsMessage::Close(None)).await;
    });

    let mut receiver = BatchReceiver::default();

    while let Some(next) = incoming.next().await {
        let raw = match next {
            Ok(WsMessage::Binary(bytes)) => bytes,
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(%peer, "read error: {e}");
                break;
            }
        };

        let wrapper = match Wrapper::decode(&raw) {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!(%peer, "dropping malformed frame: {e}");
                continue;
            }
        };

        match wrapper.message {
            WireMessage::TransferPreflight {
                root_hash,
                filenames,
                hash_algorithm,
            } => {
                if let PreflightOutcome::AlreadyActive =
                    receiver.on_preflight(wrapper.message_id, root_hash, filenames, hash_algorithm)
                {
                    let ack = Wrapper::reply_to(
                        wrapper.message_id,
                        WireMessage::TransferAck(AckResult::Error(
                            "preflight already active for this root hash".to_string(),
                        )),
                    );
                    send(&tx, ack).await;
                }
            }
            WireMessage::TransferFileUpload { filename, contents } => {
                if let Some((root_hash, files, algorithm)) =
                    receiver.on_file(wrapper.message_id, filename, contents)
                {
                    let result =
                        process_batch(root_hash, files, algorithm, state.store.as_ref(), &state.blobs)
                            .await;
                    send(
                        &tx,
                        Wrapper::reply_to(wrapper.message_id, WireMessage::TransferAck(result)),
                    )
                    .await;
                }
            }
            WireMessage::DownloadRequest { receipt_id, filename } => {
                let reply =
                    handle_download(&receipt_id, &filename, state.store.as_ref(), &state.blobs).await;
                send(&tx, Wrapper::reply_to(wrapper.message_id, reply)).await;
            }
            WireMessage::TransferAck(_) | WireMessage::TransferFileResult { .. } => {
                tracing::warn!(%peer, "ignoring server-direction frame from client");
            }
        }
    }

    drop(tx);
    let _ = writer.await;
    tracing::info!(%peer, "client disconnected");
}
