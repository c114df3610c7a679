//! Tree store backed by `sled`, an embedded ordered key/value engine.
//!
//! Three trees: `receipts` (receipt_id -> root_hash bytes), `roots`
//! (root_hash hex -> receipt_id), and `trees` (root_hash hex ->
//! bincode-encoded `MerkleTree`). `commit_batch` writes all three in one
//! sled transaction so a receipt never exists without its tree or vice
//! versa.

use crate::{Storage, StorageError};
use async_trait::async_trait;
use merkle_tree::MerkleTree;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;
use std::path::Path;

pub struct SledTreeStore {
    receipts: sled::Tree,
    roots: sled::Tree,
    trees: sled::Tree,
}

impl SledTreeStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| StorageError::Engine(e.to_string()))?;
        let receipts = db
            .open_tree("receipts")
            .map_err(|e| StorageError::Engine(e.to_string()))?;
        let roots = db
            .open_tree("roots")
            .map_err(|e| StorageError::Engine(e.to_string()))?;
        let trees = db
            .open_tree("trees")
            .map_err(|e| StorageError::Engine(e.to_string()))?;
        Ok(Self { receipts, roots, trees })
    }
}

#[async_trait]
impl Storage for SledTreeStore {
    async fn receipt_for_root_hash(&self, root_hash: &[u8]) -> Result<Option<String>, StorageError> {
        let key = hex::encode(root_hash);
        let value = self
            .roots
            .get(key.as_bytes())
            .map_err(|e| StorageError::Engine(e.to_string()))?;
        Ok(value.map(|v| String::from_utf8_lossy(&v).into_owned()))
    }

    async fn root_hash_for_receipt(&self, receipt_id: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let value = self
            .receipts
            .get(receipt_id.as_bytes())
            .map_err(|e| StorageError::Engine(e.to_string()))?;
        Ok(value.map(|v| v.to_vec()))
    }

    async fn commit_batch(
        &self,
        root_hash: &[u8],
        receipt_id: &str,
        tree: &MerkleTree,
    ) -> Result<(), StorageError> {
        let root_hash_hex = hex::encode(root_hash);
        let encoded_tree =
            bincode::serialize(tree).map_err(|e| StorageError::Encode(e.to_string()))?;

        let result: Result<(), TransactionError<StorageError>> =
            (&self.receipts, &self.roots, &self.trees).transaction(
                |(receipts, roots, trees)| {
                    receipts.insert(receipt_id.as_bytes(), root_hash.to_vec())?;
                    roots.insert(root_hash_hex.as_bytes(), receipt_id.as_bytes())?;
                    trees.insert(root_hash_hex.as_bytes(), encoded_tree.clone())?;
                    Ok::<(), ConflictableTransactionError<StorageError>>(())
                },
            );

        result.map_err(|e| StorageError::Engine(e.to_string()))
    }

    async fn load_tree(&self, root_hash: &[u8]) -> Result<Option<MerkleTree>, StorageError> {
        let key = hex::encode(root_hash);
        let value = self
            .trees
            .get(key.as_bytes())
            .map_err(|e| StorageError::Engine(e.to_string()))?;
        match value {
            None => Ok(None),
            Some(bytes) => {
                let tree = bincode::deserialize(&bytes)
                    .map_err(|e| StorageError::Decode(e.to_string()))?;
                Ok(Some(tree))
            }
        }
    }
}
