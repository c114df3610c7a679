//! Upload/download orchestrator (§4.4): correlates replies by `message_id`
//! and verifies proofs on download.

use crate::store::ClientStore;
use merkle_tree::{build, verify, HashAlgorithm};
use protocol::{AckResult, Message as WireMessage, Wrapper};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use uuid::Uuid;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(crate::constants::REQUEST_TIMEOUT_SECS);

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("batch rejected by server: {0}")]
    Rejected(String),
    #[error("server did not reply in time")]
    ServerUnresponsive,
    #[error("connection shut down while waiting for a reply")]
    ServerShutdown,
    #[error("server sent an unexpected reply")]
    UnexpectedReply,
    #[error("receipt id is not known locally")]
    UnknownReceipt,
    #[error("downloaded file does not match its proof")]
    CorruptedFile,
    #[error("server reported the file missing: {0}")]
    FileNotFound(String),
    #[error("failed to build batch: {0}")]
    BuildFailed(#[from] merkle_tree::MerkleTreeError),
    #[error(transparent)]
    Store(#[from] crate::store::ClientStoreError),
}

pub struct Orchestrator {
    pending: Mutex<HashMap<Uuid, oneshot::Sender<WireMessage>>>,
    outbound: mpsc::Sender<WsMessage>,
    store: ClientStore,
}

impl Orchestrator {
    pub fn new(outbound: mpsc::Sender<WsMessage>, store: ClientStore) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            outbound,
            store,
        }
    }

    pub async fn dispatch_reply(&self, wrapper: Wrapper) {
        let sender = self.pending.lock().unwrap().remove(&wrapper.message_id);
        if let Some(sender) = sender {
            let _ = sender.send(wrapper.message);
        }
    }

    fn register(&self, message_id: Uuid) -> oneshot::Receiver<WireMessage> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(message_id, tx);
        rx
    }

    fn deregister(&self, message_id: &Uuid) {
        self.pending.lock().unwrap().remove(message_id);
    }

    async fn send(&self, wrapper: Wrapper) -> Result<(), OrchestratorError> {
        let bytes = wrapper.encode().expect("wrapper always encodes");
        if self.outbound.send(WsMessage::Binary(bytes)).await.is_err() {
            return Err(OrchestratorError::ServerShutdown);
        }
        Ok(())
    }

    async fn wait_for_reply(
        &self,
        message_id: Uuid,
        rx: oneshot::Receiver<WireMessage>,
    ) -> Result<WireMessage, OrchestratorError> {
        match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(message)) => Ok(message),
            Ok(Err(_)) => Err(OrchestratorError::ServerShutdown),
            Err(_) => {
                self.deregister(&message_id);
                Err(OrchestratorError::ServerUnresponsive)
            }
        }
    }

    pub async fn upload(
        &self,
        files: Vec<(String, Vec<u8>)>,
        algorithm: HashAlgorithm,
    ) -> Result<String, OrchestratorError> {
        let tree = build(&files, algorithm)?;
        let message_id = Uuid::new_v4();
        let rx = self.register(message_id);

        self.send(Wrapper::reply_to(
            message_id,
            WireMessage::TransferPreflight {
                root_hash: tree.root_hash.clone(),
                filenames: files.iter().map(|(name, _)| name.clone()).collect(),
                hash_algorithm: algorithm,
            },
        ))
        .await?;

        for (filename, contents) in files {
            self.send(Wrapper::reply_to(
                message_id,
                WireMessage::TransferFileUpload { filename, contents },
            ))
            .await?;
        }

        match self.wait_for_reply(message_id, rx).await? {
            WireMessage::TransferAck(AckResult::Receipt(receipt_id)) => {
                self.store.save(&receipt_id, tree.root_hash, algorithm)?;
                Ok(receipt_id)
            }
            WireMessage::TransferAck(AckResult::Error(e)) => Err(OrchestratorError::Rejected(e)),
            _ => Err(OrchestratorError::UnexpectedReply),
        }
    }

    pub async fn download(
        &self,
        receipt_id: &str,
        filename: &str,
    ) -> Result<(Vec<u8>, Vec<merkle_tree::ProofPart>), OrchestratorError> {
        let (root_hash, algorithm) = self
            .store
            .load(receipt_id)?
            .ok_or(OrchestratorError::UnknownReceipt)?;

        let message_id = Uuid::new_v4();
        let rx = self.register(message_id);
        self.send(Wrapper::reply_to(
            message_id,
            WireMessage::DownloadRequest {
                receipt_id: receipt_id.to_string(),
                filename: filename.to_string(),
            },
        ))
        .await?;

        match self.wait_for_reply(message_id, rx).await? {
            WireMessage::TransferFileResult { error: Some(e), .. } => {
                Err(OrchestratorError::FileNotFound(e))
            }
            WireMessage::TransferFileResult { contents, proof, error: None, .. } => {
                verify(&contents, algorithm, &root_hash, &proof)
                    .map_err(|_| OrchestratorError::CorruptedFile)?;
                Ok((contents, proof))
            }
            _ => Err(OrchestratorError::UnexpectedReply),
        }
    }
}
