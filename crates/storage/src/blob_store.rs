//! Raw file bytes under `downloads/<root_hash>/<filename>`. The layout is
//! pinned by the wire contract (the receiver keys everything by root hash),
//! so unlike the tree store this isn't behind a pluggable trait.

use crate::StorageError;
use std::path::PathBuf;

pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn batch_dir(&self, root_hash_hex: &str) -> PathBuf {
        self.root.join(root_hash_hex)
    }

    pub async fn store_batch(
        &self,
        root_hash_hex: &str,
        files: &[(String, Vec<u8>)],
    ) -> Result<(), StorageError> {
        let batch_dir = self.batch_dir(root_hash_hex);
        tokio::fs::create_dir_all(&batch_dir).await?;
        for (filename, contents) in files {
            tokio::fs::write(batch_dir.join(filename), contents).await?;
        }
        Ok(())
    }

    pub async fn read_file(
        &self,
        root_hash_hex: &str,
        filename: &str,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.batch_dir(root_hash_hex).join(filename);
        match tokio::fs::read(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
