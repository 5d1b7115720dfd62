//! # Content-addressed object store
//!
//! Byte-identical persistence keyed by digest. Objects live at
//! `<root>/ledger/objects/<first2>/<64-hex>`, sharded by the first two hex
//! characters of the digest so no directory grows unboundedly.
//!
//! ## Integrity invariant
//!
//! The path of an object is derived from its digest; after a successful
//! store, re-digesting the bytes at that path yields the same digest.
//! Mismatch between claimed digest and content is a verifier concern, not a
//! store concern: `store_blob` trusts its caller-supplied digest.
//!
//! ## Write discipline
//!
//! Writes go to a same-directory `.tmp` file and are atomically renamed
//! over the destination, so readers never observe a partial object.
//! Concurrent stores of the same digest are safe: last rename wins with
//! identical content.

use std::fs;
use std::path::{Path, PathBuf};

use prov_core::Digest;

use crate::error::LedgerError;

/// Filesystem layout of a ledger repository.
///
/// Every path is derived from a caller-supplied repo root; there is no
/// process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerPaths {
    root: PathBuf,
}

impl LedgerPaths {
    /// Layout rooted at `repo_root`.
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            root: repo_root.into(),
        }
    }

    /// The repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/ledger/objects`.
    pub fn objects_dir(&self) -> PathBuf {
        self.root.join("ledger").join("objects")
    }

    /// CAS path of an object: `objects/<first2>/<64-hex>`.
    pub fn object_path(&self, digest: &Digest) -> PathBuf {
        self.objects_dir()
            .join(digest.shard_prefix())
            .join(digest.to_hex())
    }

    /// `<root>/ledger/nodes`.
    pub fn nodes_dir(&self) -> PathBuf {
        self.root.join("ledger").join("nodes")
    }

    /// Manifest path of a node: `nodes/<64-hex>.json`.
    pub fn node_manifest_path(&self, id: &Digest) -> PathBuf {
        self.nodes_dir().join(format!("{}.json", id.to_hex()))
    }

    /// `<root>/ledger/refs`.
    pub fn refs_dir(&self) -> PathBuf {
        self.root.join("ledger").join("refs")
    }

    /// Path of a named ref.
    pub fn ref_path(&self, name: &str) -> PathBuf {
        self.refs_dir().join(name)
    }

    /// Repo-wide ingest-session lock path: `ledger/.locks/ingest.lock`.
    ///
    /// Stored under `ledger/` so the lock is per-repo, not per-cwd.
    pub fn session_lock_path(&self) -> PathBuf {
        self.root.join("ledger").join(".locks").join("ingest.lock")
    }
}

/// Store a blob in the CAS under a caller-computed digest.
///
/// Idempotent: if the destination already exists it is returned unchanged.
/// Otherwise the source bytes are copied to `<dest>.tmp` and atomically
/// renamed into place. Parent directories are created on demand.
pub fn store_blob(
    paths: &LedgerPaths,
    src: &Path,
    digest: &Digest,
) -> Result<PathBuf, LedgerError> {
    let dst = paths.object_path(digest);

    if dst.exists() {
        tracing::debug!(digest = %digest.to_hex(), "object already stored");
        return Ok(dst);
    }

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }

    // Copy bytes verbatim; determinism = byte identity.
    let tmp = dst.with_extension("tmp");
    fs::copy(src, &tmp)?;
    fs::rename(&tmp, &dst)?;
    tracing::debug!(digest = %digest.to_hex(), path = %dst.display(), "stored object");
    Ok(dst)
}
