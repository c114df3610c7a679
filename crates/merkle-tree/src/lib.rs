use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

pub mod proof;
pub use proof::*;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleTreeError {
    #[error("batch must contain at least one file")]
    EmptyBatch,
    #[error("duplicate filename in batch: {0}")]
    DuplicateFilename(String),
    #[error("filename not present in tree: {0}")]
    FilenameNotInTree(String),
    #[error("proof step has no sibling to combine with")]
    InvalidProofStep,
    #[error("computed root does not match expected root")]
    RootMismatch,
}

/// Digest algorithm used for a batch. Travels on the wire as part of
/// `TRANSFER_PREFLIGHT`, so it is a closed set rather than an open trait.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Sha256,
    #[default]
    Sha512,
}

impl HashAlgorithm {
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// Digest of the zero-length byte string, used to pad a batch's leaves
    /// up to a power of two.
    pub fn empty_hash(self) -> Vec<u8> {
        self.digest(&[])
    }
}

/// Position of a node's sibling relative to itself, as recorded in
/// [`MerkleTree::nodes`]. The root's entry uses `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SiblingType {
    None,
    Left,
    Right,
}

/// One entry of the tree's hash-keyed adjacency map (§3 data model).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeEntry {
    /// Empty for the root.
    pub parent: Vec<u8>,
    /// Empty when `sibling_type` is `None`.
    pub sibling: Vec<u8>,
    pub sibling_type: SiblingType,
}

/// A built Merkle tree, held in memory while the server assembles a batch
/// or serves a proof. Read-only once constructed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MerkleTree {
    pub algorithm: HashAlgorithm,
    pub root_hash: Vec<u8>,
    pub filename_to_hash: HashMap<String, Vec<u8>>,
    /// Keyed by a node's own hash. Leaves with identical contents (and thus
    /// identical hashes) share one entry; this is harmless because any
    /// recorded parent/sibling pair for a given hash value verifies
    /// correctly against the root regardless of which tree position it
    /// originally came from.
    pub nodes: HashMap<Vec<u8>, NodeEntry>,
}

impl MerkleTree {
    pub fn root_hash_hex(&self) -> String {
        hex::encode(&self.root_hash)
    }
}

/// Build a tree from a batch of (filename, contents) pairs.
///
/// Leaves are sorted lexicographically by digest bytes (not arrival order),
/// then padded with the empty-hash until the leaf count is a power of two
/// and at least two, so a single-file batch always yields a two-leaf tree.
pub fn build(
    files: &[(String, Vec<u8>)],
    algorithm: HashAlgorithm,
) -> Result<MerkleTree, MerkleTreeError> {
    if files.is_empty() {
        return Err(MerkleTreeError::EmptyBatch);
    }

    let mut seen = HashSet::with_capacity(files.len());
    for (filename, _) in files {
        if !seen.insert(filename.as_str()) {
            return Err(MerkleTreeError::DuplicateFilename(filename.clone()));
        }
    }

    let mut filename_to_hash = HashMap::with_capacity(files.len());
    let mut leaves: Vec<Vec<u8>> = Vec::with_capacity(files.len());
    for (filename, contents) in files {
        let hash = algorithm.digest(contents);
        filename_to_hash.insert(filename.clone(), hash.clone());
        leaves.push(hash);
    }
    leaves.sort();

    let padded_len = next_power_of_two_at_least_two(leaves.len());
    let empty_hash = algorithm.empty_hash();
    leaves.resize(padded_len, empty_hash);

    let mut nodes: HashMap<Vec<u8>, NodeEntry> = HashMap::new();
    let mut level = leaves;
    loop {
        if level.len() == 1 {
            let root_hash = level.into_iter().next().unwrap();
            nodes.insert(
                root_hash.clone(),
                NodeEntry {
                    parent: Vec::new(),
                    sibling: Vec::new(),
                    sibling_type: SiblingType::None,
                },
            );
            return Ok(MerkleTree {
                algorithm,
                root_hash,
                filename_to_hash,
                nodes,
            });
        }

        let mut next_level = Vec::with_capacity(level.len() / 2);
        for pair in level.chunks_exact(2) {
            let (left, right) = (&pair[0], &pair[1]);
            let mut preimage = Vec::with_capacity(left.len() + right.len());
            preimage.extend_from_slice(left);
            preimage.extend_from_slice(right);
            let parent = algorithm.digest(&preimage);

            nodes.insert(
                left.clone(),
                NodeEntry {
                    parent: parent.clone(),
                    sibling: right.clone(),
                    sibling_type: SiblingType::Right,
                },
            );
            nodes.insert(
                right.clone(),
                NodeEntry {
                    parent: parent.clone(),
                    sibling: left.clone(),
                    sibling_type: SiblingType::Left,
                },
            );
            next_level.push(parent);
        }
        level = next_level;
    }
}

fn next_power_of_two_at_least_two(n: usize) -> usize {
    let mut target = 2usize;
    while target < n {
        target *= 2;
    }
    target
}
