pub mod blob_store;
pub mod tree_store;

pub use blob_store::BlobStore;
pub use tree_store::SledTreeStore;

use async_trait::async_trait;
use merkle_tree::MerkleTree;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage engine error: {0}")]
    Engine(String),
    #[error("failed to encode tree: {0}")]
    Encode(String),
    #[error("failed to decode tree: {0}")]
    Decode(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The tree store holds, per batch, the receipt <-> root-hash mapping and
/// the built `MerkleTree` itself. Any ordered key/value engine can back
/// this trait; `SledTreeStore` is the only implementation shipped here, but
/// nothing in the receiver or proof server depends on sled directly.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Look up a prior receipt for a root hash that has already been
    /// committed, used by the batch receiver's deduplication check.
    async fn receipt_for_root_hash(&self, root_hash: &[u8]) -> Result<Option<String>, StorageError>;

    /// Resolve a receipt id back to the root hash it was minted for.
    async fn root_hash_for_receipt(&self, receipt_id: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Atomically record the receipt <-> root-hash mapping and the tree
    /// itself. Either both land or neither does.
    async fn commit_batch(
        &self,
        root_hash: &[u8],
        receipt_id: &str,
        tree: &MerkleTree,
    ) -> Result<(), StorageError>;

    /// Load a previously committed tree by root hash.
    async fn load_tree(&self, root_hash: &[u8]) -> Result<Option<MerkleTree>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use merkle_tree::{build, HashAlgorithm};

    fn sample_tree() -> MerkleTree {
        let files = vec![("a".to_string(), b"one".to_vec()), ("b".to_string(), b"two".to_vec())];
        build(&files, HashAlgorithm::Sha256).unwrap()
    }

    #[tokio::test]
    async fn commit_then_lookup_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledTreeStore::open(dir.path()).unwrap();
        let tree = sample_tree();

        assert!(store.receipt_for_root_hash(&tree.root_hash).await.unwrap().is_none());

        store.commit_batch(&tree.root_hash, "receipt-1", &tree).await.unwrap();

        let receipt = store.receipt_for_root_hash(&tree.root_hash).await.unwrap();
        assert_eq!(receipt.as_deref(), Some("receipt-1"));

        let root_hash = store.root_hash_for_receipt("receipt-1").await.unwrap();
        assert_eq!(root_hash.as_deref(), Some(tree.root_hash.as_slice()));

        let loaded = store.load_tree(&tree.root_hash).await.unwrap().unwrap();
        assert_eq!(loaded.root_hash, tree.root_hash);
    }

    #[tokio::test]
    async fn unknown_receipt_resolves_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledTreeStore::open(dir.path()).unwrap();
        assert!(store.root_hash_for_receipt("nope").await.unwrap().is_none());
    }
}
