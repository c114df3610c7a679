use crate::{HashAlgorithm, MerkleTree, MerkleTreeError, SiblingType};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// One step of a Merkle proof: the sibling hash to combine with, and which
/// side it sits on.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProofPart {
    pub sibling_type: SiblingType,
    pub sibling_hash: Vec<u8>,
}

/// Walk `tree.nodes` from `filename`'s leaf up to the root, collecting the
/// sibling at each level.
pub fn proof(tree: &MerkleTree, filename: &str) -> Result<Vec<ProofPart>, MerkleTreeError> {
    let mut current = tree
        .filename_to_hash
        .get(filename)
        .ok_or_else(|| MerkleTreeError::FilenameNotInTree(filename.to_string()))?
        .clone();

    let mut parts = Vec::new();
    loop {
        let entry = tree
            .nodes
            .get(&current)
            .ok_or_else(|| MerkleTreeError::FilenameNotInTree(filename.to_string()))?;
        if entry.sibling_type == SiblingType::None {
            return Ok(parts);
        }
        parts.push(ProofPart {
            sibling_type: entry.sibling_type,
            sibling_hash: entry.sibling.clone(),
        });
        current = entry.parent.clone();
    }
}

/// Recompute the root from a leaf's contents and a proof path, and compare
/// it against `expected_root` in constant time.
pub fn verify(
    contents: &[u8],
    algorithm: HashAlgorithm,
    expected_root: &[u8],
    proof: &[ProofPart],
) -> Result<(), MerkleTreeError> {
    let mut current = algorithm.digest(contents);

    for part in proof {
        let mut preimage = Vec::with_capacity(current.len() + part.sibling_hash.len());
        match part.sibling_type {
            SiblingType::Left => {
                preimage.extend_from_slice(&part.sibling_hash);
                preimage.extend_from_slice(&current);
            }
            SiblingType::Right => {
                preimage.extend_from_slice(&current);
                preimage.extend_from_slice(&part.sibling_hash);
            }
            SiblingType::None => return Err(MerkleTreeError::InvalidProofStep),
        }
        current = algorithm.digest(&preimage);
    }

    if current.ct_eq(expected_root).into() {
        Ok(())
    } else {
        Err(MerkleTreeError::RootMismatch)
    }
}
