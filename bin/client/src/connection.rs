//! Persistent WebSocket link to the server (§4.3): reconnect with
//! exponential backoff, a single writer that also emits idle pings, and a
//! reader that hands decoded frames to the orchestrator.

use crate::constants::{GIVE_UP_AFTER_SECS, INITIAL_BACKOFF_SECS, MAX_BACKOFF_SECS, PING_INTERVAL_SECS};
use crate::orchestrator::Orchestrator;
use futures_util::{SinkExt, StreamExt};
use protocol::Wrapper;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("reconnection exhausted after {0:?} of retrying")]
    ReconnectExhausted(Duration),
}

/// Tracks whether the link currently holds a live connection, for the
/// façade's `/health` probe.
#[derive(Clone, Default)]
pub struct LinkStatus(Arc<AtomicBool>);

impl LinkStatus {
    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn set(&self, live: bool) {
        self.0.store(live, Ordering::Relaxed);
    }
}

pub async fn run(
    url: String,
    orchestrator: Arc<Orchestrator>,
    mut outbound_rx: mpsc::Receiver<WsMessage>,
    status: LinkStatus,
) -> Result<(), ConnectionError> {
    let mut backoff = Duration::from_secs(INITIAL_BACKOFF_SECS);
    let mut disconnected_since: Option<Instant> = Some(Instant::now());

    loop {
        match tokio_tungstenite::connect_async(&url).await {
            Ok((ws_stream, _)) => {
                tracing::info!(%url, "connected to server");
                status.set(true);
                disconnected_since = None;
                backoff = Duration::from_secs(INITIAL_BACKOFF_SECS);

                let (mut write, mut read) = ws_stream.split();
                let reader_orchestrator = orchestrator.clone();
                let read_task = tokio::spawn(async move {
                    while let Some(msg) = read.next().await {
                        match msg {
                            Ok(WsMessage::Binary(bytes)) => {
                                if let Ok(wrapper) = Wrapper::decode(&bytes) {
                                    reader_orchestrator.dispatch_reply(wrapper).await;
                                } else {
                                    tracing::warn!("dropping malformed frame from server");
                                }
                            }
                            Ok(WsMessage::Close(_)) => break,
                            Ok(_) => continue,
                            Err(e) => {
                                tracing::warn!("read error: {e}");
                                break;
                            }
                        }
                    }
                });

                'connected: loop {
                    tokio::select! {
                        maybe_msg = outbound_rx.recv() => {
                            match maybe_msg {
                                Some(msg) => {
                                    if write.send(msg).await.is_err() {
                                        tracing::warn!("write failed, reconnecting");
                                        break 'connected;
                                    }
                                }
                                None => {
                                    let _ = write.send(WsMessage::Close(None)).await;
                                    read_task.abort();
                                    return Ok(());
                                }
                            }
                        }
                        _ = tokio::time::sleep(Duration::from_secs(PING_INTERVAL_SECS)) => {
                            if write.send(WsMessage::Ping(Vec::new())).await.is_err() {
                                tracing::warn!("ping failed, reconnecting");
                                break 'connected;
                            }
                        }
                    }
                }

                read_task.abort();
                status.set(false);
                disconnected_since.get_or_insert_with(Instant::now);
            }
            Err(e) => {
                tracing::warn!("connect failed: {e}");
                status.set(false);
                disconnected_since.get_or_insert_with(Instant::now);
            }
        }

        let elapsed = disconnected_since.map(|t| t.elapsed()).unwrap_or_default();
        if elapsed >= Duration::from_secs(GIVE_UP_AFTER_SECS) {
            return Err(ConnectionError::ReconnectExhausted(elapsed));
        }

        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(Duration::from_secs(MAX_BACKOFF_SECS));
    }
}
