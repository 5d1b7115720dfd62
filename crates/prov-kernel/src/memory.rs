//! # Content-addressed memory DAG
//!
//! An in-memory node store where each node's identity covers both its data
//! and its ordered parent links:
//!
//! ```text
//! hash = sha256(canonical({"data_sha256": sha256(data), "parents": [...]}))
//! ```
//!
//! Because the hash covers the parents, a node cannot link to itself or to
//! any descendant; the store is a DAG by construction. Iteration order is
//! not part of the contract.

use std::collections::HashMap;

use serde::Serialize;

use prov_core::{canonical_json, sha256_hex};

use crate::error::KernelError;

/// One memory node: opaque data plus ordered parent hashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemNode {
    /// Opaque payload bytes.
    pub data: Vec<u8>,
    /// Ordered parent node hashes.
    pub parents: Vec<String>,
}

/// The addressing envelope that gets canonicalized and hashed.
#[derive(Serialize)]
struct NodeEnvelope<'a> {
    data_sha256: String,
    parents: &'a [String],
}

/// In-memory content-addressed node store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    store: HashMap<String, MemNode>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, returning its content hash.
    ///
    /// Idempotent: an already-present hash leaves the existing entry
    /// untouched and returns the same value.
    pub fn put(&mut self, data: &[u8], parents: &[String]) -> Result<String, KernelError> {
        let envelope = NodeEnvelope {
            data_sha256: sha256_hex(data),
            parents,
        };
        let h = sha256_hex(canonical_json(&envelope)?.as_bytes());
        self.store.entry(h.clone()).or_insert_with(|| MemNode {
            data: data.to_vec(),
            parents: parents.to_vec(),
        });
        Ok(h)
    }

    /// Look up a node by hash.
    pub fn get(&self, h: &str) -> Result<&MemNode, KernelError> {
        self.store
            .get(h)
            .ok_or_else(|| KernelError::NotFound(h.to_string()))
    }

    /// Whether a hash is present.
    pub fn contains(&self, h: &str) -> bool {
        self.store.contains_key(h)
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// True when no nodes are stored.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Re-inserting identical arguments returns the same hash and does
        /// not grow the store.
        #[test]
        fn put_idempotent(
            data in prop::collection::vec(any::<u8>(), 0..64),
            parents in prop::collection::vec("[0-9a-f]{64}", 0..4),
        ) {
            let mut mem = MemoryStore::new();
            let first = mem.put(&data, &parents).unwrap();
            let len = mem.len();
            let second = mem.put(&data, &parents).unwrap();
            prop_assert_eq!(first, second);
            prop_assert_eq!(mem.len(), len);
        }

        /// The returned hash is a bare 64-hex string.
        #[test]
        fn hashes_are_bare_hex(data in prop::collection::vec(any::<u8>(), 0..64)) {
            let mut mem = MemoryStore::new();
            let h = mem.put(&data, &[]).unwrap();
            prop_assert!(prov_core::is_hex_digest(&h));
        }
    }
}
