//! # Ingest driver
//!
//! End-to-end admission of an artifact: hash the source, store the blob,
//! emit the immutable node manifest. The whole transaction runs inside the
//! session lock window (when enabled), and the manifest write comes last:
//! it is the linearization point after which other readers can observe the
//! node, and by then the blob is already on disk.
//!
//! Ingest is not idempotent by design: re-ingesting an id that already has
//! a manifest fails with the append-only error, and the caller decides
//! whether a pre-existing identical manifest is acceptable.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use prov_core::{sha256_file, Digest};

use crate::cas::{store_blob, LedgerPaths};
use crate::error::LedgerError;
use crate::lock::{session_lock_enabled, SessionLock};
use crate::manifest::{write_node_manifest, Node, RunnerSpec, Transform};

/// Everything needed to admit one artifact.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    /// The file whose bytes become the artifact.
    pub source: PathBuf,
    /// Ordered parent node ids.
    pub parents: Vec<Digest>,
    /// Transform name. Defaults to the transform file's name when a file is
    /// given, else to `"unspecified"`.
    pub transform_name: Option<String>,
    /// Transform definition file. When present its bytes are stored in the
    /// CAS and its digest pins the transform (replayable); when absent the
    /// transform digest is the digest of the name bytes (non-replayable
    /// admission marker).
    pub transform_file: Option<PathBuf>,
    /// Replay runner override.
    pub runner: Option<RunnerSpec>,
    /// Digest of an execution-environment blob.
    pub env_digest: Option<Digest>,
    /// Semantic transform parameters.
    pub params: Map<String, Value>,
    /// Non-semantic note, recorded under `meta.note`.
    pub note: Option<String>,
    /// Opt out of the session lock (not recommended).
    pub no_session_lock: bool,
}

/// Admit an artifact and write its node manifest.
///
/// Returns the artifact id. One atomic operation: when the session lock is
/// enabled, every step below runs while holding it.
pub fn ingest_artifact(repo_root: &Path, req: &IngestRequest) -> Result<Digest, LedgerError> {
    let paths = LedgerPaths::new(repo_root);

    let _lock = if session_lock_enabled(req.no_session_lock) {
        Some(SessionLock::acquire(&paths)?)
    } else {
        tracing::warn!("ingest session lock disabled");
        None
    };

    if !req.source.exists() {
        return Err(LedgerError::Missing {
            what: "source file",
            path: req.source.clone(),
            hint: None,
        });
    }
    let artifact_id = sha256_file(&req.source)?;
    store_blob(&paths, &req.source, &artifact_id)?;

    let (transform_name, transform_digest) = match &req.transform_file {
        Some(tf) => {
            if !tf.exists() {
                return Err(LedgerError::Missing {
                    what: "transform file",
                    path: tf.clone(),
                    hint: None,
                });
            }
            let digest = sha256_file(tf)?;
            // Store the definition so the node can be replayed by digest.
            store_blob(&paths, tf, &digest)?;
            let name = req.transform_name.clone().unwrap_or_else(|| {
                tf.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "unspecified".into())
            });
            (name, digest)
        }
        None => {
            let name = req
                .transform_name
                .clone()
                .unwrap_or_else(|| "unspecified".into());
            // Stable identifier for non-replayable admissions.
            let digest = Digest::of(name.as_bytes());
            (name, digest)
        }
    };

    let node = Node {
        id: artifact_id,
        parents: req.parents.clone(),
        transform: Transform {
            name: transform_name,
            digest: transform_digest,
            params: req.params.clone(),
            runner: req.runner.clone(),
            env_digest: req.env_digest,
        },
        meta: req.note.as_ref().map(|note| {
            let mut m = Map::new();
            m.insert("note".into(), Value::String(note.clone()));
            m
        }),
    };
    write_node_manifest(&paths, &node)?;

    tracing::info!(id = %artifact_id.to_hex(), "ingested artifact");
    Ok(artifact_id)
}
