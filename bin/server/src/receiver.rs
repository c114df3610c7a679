use merkle_tree::{build, HashAlgorithm};
use protocol::AckResult;
use std::collections::{HashMap, HashSet};
use storage::{BlobStore, Storage};
use uuid::Uuid;

/// Root hash, buffered files, and digest algorithm of a batch ready to commit.
type CompletedBatch = (Vec<u8>, Vec<(String, Vec<u8>)>, HashAlgorithm);

struct ActiveBatch {
    root_hash: Vec<u8>,
    filenames: Vec<String>,
    algorithm: HashAlgorithm,
    buffered: Vec<(String, Vec<u8>)>,
}

/// Per-connection state for §4.5. File frames carry no root hash of their
/// own; they're correlated to their preflight by the shared `message_id`,
/// while `active_root_hashes` backs the "preflight already active" guard
/// that the spec states in terms of `root_hash`.
#[derive(Default)]
pub struct BatchReceiver {
    by_message_id: HashMap<Uuid, ActiveBatch>,
    active_root_hashes: HashSet<Vec<u8>>,
}

pub enum PreflightOutcome {
    Accepted,
    AlreadyActive,
}

impl BatchReceiver {
    pub fn on_preflight(
        &mut self,
        message_id: Uuid,
        root_hash: Vec<u8>,
        filenames: Vec<String>,
        algorithm: HashAlgorithm,
    ) -> PreflightOutcome {
        if self.active_root_hashes.contains(&root_hash) {
            return PreflightOutcome::AlreadyActive;
        }
        self.active_root_hashes.insert(root_hash.clone());
        self.by_message_id.insert(
            message_id,
            ActiveBatch {
                root_hash,
                filenames,
                algorithm,
                buffered: Vec::new(),
            },
        );
        PreflightOutcome::Accepted
    }

    /// Buffers a file frame. Returns the batch's declared root hash, files,
    /// and digest once every expected file has arrived.
    pub fn on_file(
        &mut self,
        message_id: Uuid,
        filename: String,
        contents: Vec<u8>,
    ) -> Option<CompletedBatch> {
        let batch = self.by_message_id.get_mut(&message_id)?;
        batch.buffered.push((filename, contents));
        if batch.buffered.len() != batch.filenames.len() {
            return None;
        }
        let batch = self.by_message_id.remove(&message_id)?;
        self.active_root_hashes.remove(&batch.root_hash);
        Some((batch.root_hash, batch.buffered, batch.algorithm))
    }
}

/// §4.5 processing: build, dedup, root-match, commit. Exactly-once per
/// root hash because a connection only completes a batch once.
pub async fn process_batch(
    declared_root_hash: Vec<u8>,
    files: Vec<(String, Vec<u8>)>,
    algorithm: HashAlgorithm,
    store: &dyn Storage,
    blobs: &BlobStore,
) -> AckResult {
    let tree = match build(&files, algorithm) {
        Ok(tree) => tree,
        Err(e) => {
            tracing::warn!("batch failed to build: {e}");
            return AckResult::Error("server cannot process".to_string());
        }
    };

    match store.receipt_for_root_hash(&tree.root_hash).await {
        Ok(Some(existing_receipt)) => {
            tracing::info!(root_hash = %tree.root_hash_hex(), "duplicate batch, replying with prior receipt");
            return AckResult::Error(format!("already processed; receipt: {existing_receipt}"));
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!("storage failure checking dedup: {e}");
            return AckResult::Error("server cannot process".to_string());
        }
    }

    if tree.root_hash != declared_root_hash {
        tracing::warn!("client-declared root hash did not match computed root");
        return AckResult::Error("proofs mismatch".to_string());
    }

    let root_hash_hex = tree.root_hash_hex();
    if let Err(e) = blobs.store_batch(&root_hash_hex, &files).await {
        tracing::error!("blob store failure: {e}");
        return AckResult::Error("server cannot process".to_string());
    }

    let receipt_id = Uuid::new_v4().to_string();
    if let Err(e) = store.commit_batch(&tree.root_hash, &receipt_id, &tree).await {
        tracing::error!("tree store failure: {e}");
        return AckResult::Error("server cannot process".to_string());
    }

    tracing::info!(root_hash = %root_hash_hex, %receipt_id, "batch committed");
    AckResult::Receipt(receipt_id)
}
