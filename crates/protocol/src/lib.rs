use merkle_tree::{HashAlgorithm, ProofPart};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to decode frame: {0}")]
    Decode(String),
    #[error("failed to encode frame: {0}")]
    Encode(String),
}

/// Every wire message the client and server exchange, already a tagged sum
/// type rather than a type-tag-plus-opaque-bytes pair — bincode derives a
/// stable discriminant from variant order, so the dispatcher is a `match`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Message {
    /// client -> server. `root_hash` is the batch's locally-computed
    /// commitment, computed by the client before any file frame is sent, so
    /// the receiver can key its `expected`/`buffer` maps by it immediately.
    TransferPreflight {
        root_hash: Vec<u8>,
        filenames: Vec<String>,
        hash_algorithm: HashAlgorithm,
    },
    /// client -> server, one per file in the batch.
    TransferFileUpload { filename: String, contents: Vec<u8> },
    /// server -> client, reply to a `DownloadRequest`.
    TransferFileResult {
        filename: String,
        contents: Vec<u8>,
        proof: Vec<ProofPart>,
        error: Option<String>,
    },
    /// server -> client, terminal reply to a preflight + file batch.
    TransferAck(AckResult),
    /// client -> server.
    DownloadRequest { receipt_id: String, filename: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AckResult {
    Receipt(String),
    Error(String),
}

/// The one frame type that rides the WebSocket: a correlation id plus the
/// message itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Wrapper {
    pub message_id: Uuid,
    pub message: Message,
}

impl Wrapper {
    pub fn new(message: Message) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            message,
        }
    }

    pub fn reply_to(message_id: Uuid, message: Message) -> Self {
        Self { message_id, message }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        bincode::serialize(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        bincode::deserialize(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapper_round_trips_through_bincode() {
        let wrapper = Wrapper::new(Message::TransferPreflight {
            root_hash: vec![1, 2, 3],
            filenames: vec!["a.txt".to_string()],
            hash_algorithm: HashAlgorithm::Sha512,
        });

        let bytes = wrapper.encode().unwrap();
        let decoded = Wrapper::decode(&bytes).unwrap();

        assert_eq!(decoded.message_id, wrapper.message_id);
        match decoded.message {
            Message::TransferPreflight { root_hash, filenames, .. } => {
                assert_eq!(root_hash, vec![1, 2, 3]);
                assert_eq!(filenames, vec!["a.txt".to_string()]);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn decoding_garbage_bytes_fails_cleanly() {
        assert!(Wrapper::decode(&[0xff, 0x00, 0x01]).is_err());
    }

    #[test]
    fn ack_result_is_exclusive() {
        let wrapper = Wrapper::reply_to(Uuid::new_v4(), Message::TransferAck(AckResult::Receipt("r1".into())));
        let bytes = wrapper.encode().unwrap();
        let decoded = Wrapper::decode(&bytes).unwrap();
        assert!(matches!(decoded.message, Message::TransferAck(AckResult::Receipt(r)) if r == "r1"));
    }
}
