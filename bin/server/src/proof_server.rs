use merkle_tree::proof;
use protocol::Message;
use storage::{BlobStore, Storage};

/// §4.6: resolve receipt -> root hash -> blob + tree -> proof.
pub async fn handle_download(
    receipt_id: &str,
    filename: &str,
    store: &dyn Storage,
    blobs: &BlobStore,
) -> Message {
    let not_found = || Message::TransferFileResult {
        filename: filename.to_string(),
        contents: Vec::new(),
        proof: Vec::new(),
        error: Some("not found".to_string()),
    };

    let root_hash = match store.root_hash_for_receipt(receipt_id).await {
        Ok(Some(root_hash)) => root_hash,
        Ok(None) => return not_found(),
        Err(e) => {
            tracing::error!("storage failure resolving receipt: {e}");
            return not_found();
        }
    };
    let root_hash_hex = hex::encode(&root_hash);

    let contents = match blobs.read_file(&root_hash_hex, filename).await {
        Ok(Some(contents)) => contents,
        Ok(None) => return not_found(),
        Err(e) => {
            tracing::error!("blob store failure reading file: {e}");
            return not_found();
        }
    };

    let tree = match store.load_tree(&root_hash).await {
        Ok(Some(tree)) => tree,
        Ok(None) => return not_found(),
        Err(e) => {
            tracing::error!("storage failure loading tree: {e}");
            return not_found();
        }
    };

    match proof(&tree, filename) {
        Ok(path) => Message::TransferFileResult {
            filename: filename.to_string(),
            contents,
            proof: path,
            error: None,
        },
        Err(_) => not_found(),
    }
}
