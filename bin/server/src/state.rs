use std::sync::Arc;
use storage::{BlobStore, Storage};

/// Shared across all connections; each connection otherwise owns its own
/// batch-receiver state (§5: one physical connection serves one logical
/// client at a time).
pub struct ServerState {
    pub store: Arc<dyn Storage>,
    pub blobs: Arc<BlobStore>,
}

impl ServerState {
    pub fn new(store: Arc<dyn Storage>, blobs: Arc<BlobStore>) -> Self {
        Self { store, blobs }
    }
}
