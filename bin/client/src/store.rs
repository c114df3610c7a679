//! Client-side `(receipt_id, root_hash)` persistence (§4.4 step 5). Also
//! records the digest algorithm, since `Verify` needs it and it isn't
//! otherwise recoverable from a receipt id alone.

use merkle_tree::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientStoreError {
    #[error("local store error: {0}")]
    Engine(String),
}

#[derive(Serialize, Deserialize)]
struct Record {
    root_hash: Vec<u8>,
    algorithm: HashAlgorithm,
}

pub struct ClientStore {
    receipts: sled::Tree,
}

impl ClientStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClientStoreError> {
        let db = sled::open(path).map_err(|e| ClientStoreError::Engine(e.to_string()))?;
        let receipts = db
            .open_tree("receipts")
            .map_err(|e| ClientStoreError::Engine(e.to_string()))?;
        Ok(Self { receipts })
    }

    pub fn save(
        &self,
        receipt_id: &str,
        root_hash: Vec<u8>,
        algorithm: HashAlgorithm,
    ) -> Result<(), ClientStoreError> {
        let record = Record { root_hash, algorithm };
        let encoded = bincode::serialize(&record).map_err(|e| ClientStoreError::Engine(e.to_string()))?;
        self.receipts
            .insert(receipt_id.as_bytes(), encoded)
            .map_err(|e| ClientStoreError::Engine(e.to_string()))?;
        Ok(())
    }

    pub fn load(&self, receipt_id: &str) -> Result<Option<(Vec<u8>, HashAlgorithm)>, ClientStoreError> {
        let value = self
            .receipts
            .get(receipt_id.as_bytes())
            .map_err(|e| ClientStoreError::Engine(e.to_string()))?;
        match value {
            None => Ok(None),
            Some(bytes) => {
                let record: Record =
                    bincode::deserialize(&bytes).map_err(|e| ClientStoreError::Engine(e.to_string()))?;
                Ok(Some((record.root_hash, record.algorithm)))
            }
        }
    }
}
