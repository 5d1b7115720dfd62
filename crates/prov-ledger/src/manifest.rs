//! # Node manifests
//!
//! A node manifest is the immutable on-disk JSON record describing one
//! artifact and its derivation: the artifact's digest, the ordered parent
//! ids, and the transform contract (name, digest, params, optional runner
//! and environment digest).
//!
//! ## Append-only invariant
//!
//! Manifests are write-once. `write_node_manifest` creates the file with
//! `create_new`, so a second write to the same id fails atomically even
//! under concurrent writers, with no TOCTOU window between an existence
//! check and the write.
//!
//! ## Serialization
//!
//! Human-readable JSON with sorted keys, 2-space indentation, and a
//! trailing newline. Optional fields are written only when present. The
//! sorted-keys form is what gets digested by any downstream cross-check, so
//! it must stay byte-stable.
//!
//! ## Reading
//!
//! `read_node_manifest` returns the raw `serde_json::Value`: unknown keys
//! are preserved and missing required keys are not synthesized. Consumers
//! (replay, verify) apply explicit structural validation so they can
//! distinguish missing from ill-typed from well-formed fields.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use prov_core::Digest;

use crate::cas::LedgerPaths;
use crate::error::LedgerError;

/// Replay runner contract.
///
/// Manifests in the wild carry the runner as either a single string or an
/// array of strings; both shapes are semantic and must round-trip. Absence
/// (the `Option` around this type) selects the platform default at replay
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunnerSpec {
    /// A single-program runner, e.g. `"python3"`.
    Single(String),
    /// A full command prefix, e.g. `["python3", "-I"]`.
    Argv(Vec<String>),
}

impl RunnerSpec {
    /// The command prefix this spec denotes.
    pub fn argv(&self) -> Vec<String> {
        match self {
            Self::Single(s) => vec![s.clone()],
            Self::Argv(v) => v.clone(),
        }
    }
}

/// The derivation contract of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Human identifier; not semantic.
    pub name: String,
    /// Digest of the transform-definition blob in the CAS (replayable), or
    /// of the name bytes (non-replayable admission marker).
    pub digest: Digest,
    /// Parameters passed to the transform on replay, canonically serialized.
    pub params: Map<String, Value>,
    /// Replay command prefix. When absent, replay falls back to the
    /// documented platform default (`["python3"]`); when present, this
    /// field is authoritative.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner: Option<RunnerSpec>,
    /// Digest of a CAS blob describing the execution environment
    /// (lockfile, container recipe). Presence in the CAS is the contract;
    /// the contents are not interpreted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_digest: Option<Digest>,
}

/// One ledger node: an artifact and its derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Digest of the artifact this node describes.
    pub id: Digest,
    /// Ordered parent node ids. Order is semantic (it is the input order
    /// passed to the transform); duplicates are permitted; empty means an
    /// admission node.
    pub parents: Vec<Digest>,
    /// The derivation contract.
    pub transform: Transform,
    /// Non-semantic annotations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

/// Render a manifest in its on-disk form: sorted keys, 2-space indent,
/// trailing newline.
fn manifest_text(node: &Node) -> Result<String, LedgerError> {
    // Round-tripping through Value sorts keys (serde_json's default map is
    // a BTreeMap), matching the digested canonical field order.
    let value = serde_json::to_value(node)?;
    let mut text = serde_json::to_string_pretty(&value)?;
    text.push('\n');
    Ok(text)
}

/// Write a node manifest, enforcing the append-only invariant.
///
/// Fails with [`LedgerError::ManifestExists`] if a manifest for this id is
/// already on disk.
pub fn write_node_manifest(paths: &LedgerPaths, node: &Node) -> Result<PathBuf, LedgerError> {
    let path = paths.node_manifest_path(&node.id);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let text = manifest_text(node)?;

    // Atomic create-if-absent: manifests are immutable once created.
    match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(mut f) => {
            f.write_all(text.as_bytes())?;
            tracing::debug!(id = %node.id.to_hex(), "wrote node manifest");
            Ok(path)
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(LedgerError::ManifestExists(path))
        }
        Err(e) => Err(e.into()),
    }
}

/// Read a node manifest as raw JSON.
///
/// Unknown keys are preserved; nothing is synthesized. Missing file is
/// [`LedgerError::Missing`]; malformed JSON is [`LedgerError::Json`].
pub fn read_node_manifest(paths: &LedgerPaths, id: &Digest) -> Result<Value, LedgerError> {
    let path = paths.node_manifest_path(id);
    let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LedgerError::Missing {
                what: "manifest",
                path,
                hint: None,
            });
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_node(with_optionals: bool) -> Node {
        let mut params = Map::new();
        params.insert("suffix".into(), Value::String("!".into()));
        Node {
            id: Digest::of(b"artifact"),
            parents: vec![Digest::of(b"hello"), Digest::of(b"world")],
            transform: Transform {
                name: "concat".into(),
                digest: Digest::of(b"transform body"),
                params,
                runner: with_optionals.then(|| RunnerSpec::Argv(vec!["python3".into()])),
                env_digest: with_optionals.then(|| Digest::of(b"env")),
            },
            meta: with_optionals.then(|| {
                let mut m = Map::new();
                m.insert("note".into(), Value::String("first".into()));
                m
            }),
        }
    }

    #[test]
    fn manifest_text_sorted_keys_trailing_newline() {
        let text = manifest_text(&sample_node(true)).unwrap();
        assert!(text.ends_with('\n'));
        // Top-level key order is sorted: id, meta, parents, transform.
        let id_pos = text.find("\"id\"").unwrap();
        let meta_pos = text.find("\"meta\"").unwrap();
        let parents_pos = text.find("\"parents\"").unwrap();
        let transform_pos = text.find("\"transform\"").unwrap();
        assert!(id_pos < meta_pos && meta_pos < parents_pos && parents_pos < transform_pos);
        // 2-space indentation.
        assert!(text.contains("\n  \"id\""));
    }

    #[test]
    fn optional_fields_omitted_when_absent() {
        let text = manifest_text(&sample_node(false)).unwrap();
        assert!(!text.contains("runner"));
        assert!(!text.contains("env_digest"));
        assert!(!text.contains("meta"));
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LedgerPaths::new(dir.path());
        let node = sample_node(true);

        write_node_manifest(&paths, &node).unwrap();
        let value = read_node_manifest(&paths, &node.id).unwrap();

        assert_eq!(value["id"], Value::String(node.id.to_hex()));
        assert_eq!(value["parents"][0], Value::String(node.parents[0].to_hex()));
        assert_eq!(value["transform"]["name"], Value::String("concat".into()));
        assert_eq!(value["transform"]["params"]["suffix"], Value::String("!".into()));
        assert_eq!(value["meta"]["note"], Value::String("first".into()));
    }

    #[test]
    fn second_write_fails_append_only() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LedgerPaths::new(dir.path());
        let node = sample_node(false);

        write_node_manifest(&paths, &node).unwrap();
        let before = fs::read_to_string(paths.node_manifest_path(&node.id)).unwrap();

        let err = write_node_manifest(&paths, &node).unwrap_err();
        assert!(matches!(err, LedgerError::ManifestExists(_)));

        // The first write is untouched.
        let after = fs::read_to_string(paths.node_manifest_path(&node.id)).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn read_missing_manifest_errors() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LedgerPaths::new(dir.path());
        let err = read_node_manifest(&paths, &Digest::of(b"absent")).unwrap_err();
        assert!(matches!(err, LedgerError::Missing { what: "manifest", .. }));
    }

    #[test]
    fn read_preserves_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LedgerPaths::new(dir.path());
        let id = Digest::of(b"forward-compat");
        let path = paths.node_manifest_path(&id);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            format!(
                "{{\"id\":\"{}\",\"parents\":[],\"transform\":{{}},\"extra\":7}}\n",
                id.to_hex()
            ),
        )
        .unwrap();

        let value = read_node_manifest(&paths, &id).unwrap();
        assert_eq!(value["extra"], Value::from(7));
    }

    #[test]
    fn runner_spec_round_trips_both_shapes() {
        let single: RunnerSpec = serde_json::from_str("\"python3\"").unwrap();
        assert_eq!(single, RunnerSpec::Single("python3".into()));
        assert_eq!(single.argv(), vec!["python3".to_string()]);

        let argv: RunnerSpec = serde_json::from_str("[\"python3\",\"-I\"]").unwrap();
        assert_eq!(
            argv.argv(),
            vec!["python3".to_string(), "-I".to_string()]
        );

        assert_eq!(serde_json::to_string(&single).unwrap(), "\"python3\"");
        assert_eq!(
            serde_json::to_string(&argv).unwrap(),
            "[\"python3\",\"-I\"]"
        );
    }
}
