//! Content hashing for names.
//!
//! Wraps Blake3 with domain separation. A node is computed recursively:
//! the root is all zeros and each label folds its hash into the parent's
//! node, so `make_node(namehash("eth"), label_hash(b"alice"))` equals
//! `namehash("alice.eth")`.

use crate::name::DnsName;
use crate::types::{LabelHash, Node};

const LABEL_DOMAIN: &[u8] = b"namewrap-label-v0:";
const NODE_DOMAIN: &[u8] = b"namewrap-node-v0:";

/// Hash a single label.
pub fn label_hash(label: &[u8]) -> LabelHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(LABEL_DOMAIN);
    hasher.update(label);
    LabelHash(*hasher.finalize().as_bytes())
}

/// Derive a child node from its parent node and label hash.
pub fn make_node(parent: &Node, label_hash: &LabelHash) -> Node {
    let mut hasher = blake3::Hasher::new();
    hasher.update(NODE_DOMAIN);
    hasher.update(&parent.0);
    hasher.update(&label_hash.0);
    Node(*hasher.finalize().as_bytes())
}

/// Compute the node of a full name.
pub fn namehash(name: &DnsName) -> Node {
    name.labels()
        .iter()
        .rev()
        .fold(Node::ROOT, |node, label| make_node(&node, &label.hash()))
}
