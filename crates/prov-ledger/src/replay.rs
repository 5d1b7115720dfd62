//! # Derivation replay
//!
//! Re-executes a node's derivation from its pinned transform, parents, and
//! params, and asserts byte equality of the output against the declared id.
//! The engine does not enforce transform determinism; it tests it via the
//! output-digest check.
//!
//! ## Workdir contract
//!
//! Inside a caller-supplied or scratch working directory:
//!
//! ```text
//! parents/<NNN>_<64-hex>.bin    byte-for-byte parent copies, declared order
//! parents.json                  ordered [{index, id, path}, ...]
//! params.json                   canonical JSON of transform.params + "\n"
//! transform_<64-hex>.py         byte-for-byte transform blob
//! out.bin                       the transform's output (written by it)
//! ```
//!
//! The transform is invoked as
//! `<runner...> <transform-path> --parents-manifest <p> --parents-dir <d>
//! --params-path <q> --out <o>` with the workdir as CWD. Zero exit and a
//! present output file are required; the output's SHA-256 must equal the
//! node id.
//!
//! ## Security
//!
//! Replay executes code. Do not run it on untrusted transforms without
//! external sandboxing; the caller is trusted to arrange isolation.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::{Map, Value};

use prov_core::{canonical_json, is_hex_digest, sha256_file, Digest};

use crate::cas::LedgerPaths;
use crate::error::LedgerError;
use crate::manifest::read_node_manifest;

/// Platform-default replay runner, used when a manifest carries no
/// `runner`. A manifest's own runner, when present, is authoritative.
pub const DEFAULT_RUNNER: &[&str] = &["python3"];

/// Outcome of a replay attempt.
///
/// `ok` with an empty error list means the derivation reproduced the
/// declared artifact byte-for-byte. On failure, `errors` carries the full
/// diagnostic set, including captured transform output for runtime
/// failures.
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    /// Whether the replay reproduced the declared output.
    pub ok: bool,
    /// Accumulated diagnostics; empty iff `ok`.
    pub errors: Vec<String>,
    /// Digest of the produced output, when one was produced.
    pub output_digest: Option<Digest>,
    /// The working directory, when it still exists (caller-supplied, or
    /// kept on request, or left behind by a post-creation failure with
    /// `keep`).
    pub workdir: Option<PathBuf>,
}

impl ReplayOutcome {
    fn fail(errors: Vec<String>) -> Self {
        Self {
            ok: false,
            errors,
            output_digest: None,
            workdir: None,
        }
    }

    fn fail_in(workdir: &Path, errors: Vec<String>) -> Self {
        Self {
            ok: false,
            errors,
            output_digest: None,
            workdir: Some(workdir.to_path_buf()),
        }
    }
}

/// Structurally validated replay inputs extracted from a manifest.
#[derive(Debug)]
struct ReplayPlan {
    parents: Vec<String>,
    transform_digest: Digest,
    env_digest: Option<Digest>,
    runner: Vec<String>,
    params: Map<String, Value>,
}

/// Validate the dynamic manifest shape, distinguishing missing from
/// ill-typed fields. Returns the first structural error as a message.
fn plan_from_manifest(manifest: &Value) -> Result<Option<ReplayPlan>, String> {
    let parents = match manifest.get("parents") {
        None => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(_) => return Err("manifest.parents not a list".into()),
    };

    // Root/admission nodes have no derivation to replay.
    if parents.is_empty() {
        return Ok(None);
    }

    let empty_transform = Map::new();
    let transform = match manifest.get("transform") {
        None => &empty_transform,
        Some(Value::Object(t)) => t,
        Some(_) => return Err("manifest.transform not an object".into()),
    };

    let transform_digest = match transform.get("digest").and_then(Value::as_str) {
        Some(s) if is_hex_digest(s) => Digest::parse(s)
            .map_err(|e| format!("manifest.transform.digest invalid: {e}"))?,
        _ => return Err("manifest.transform.digest missing/invalid".into()),
    };

    let env_digest = match transform.get("env_digest") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if is_hex_digest(s) => Some(
            Digest::parse(s).map_err(|e| format!("manifest.transform.env_digest invalid: {e}"))?,
        ),
        Some(_) => {
            return Err("manifest.transform.env_digest invalid (expected 64-hex)".into());
        }
    };

    let runner = match transform.get("runner") {
        None | Some(Value::Null) => DEFAULT_RUNNER.iter().map(|s| s.to_string()).collect(),
        Some(Value::Array(items))
            if !items.is_empty() && items.iter().all(Value::is_string) =>
        {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        }
        // Lenient fallback: allow a single-string runner.
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(_) => {
            return Err("manifest.transform.runner invalid (expected array[str])".into());
        }
    };

    let params = match transform.get("params") {
        None => Map::new(),
        Some(Value::Object(m)) => m.clone(),
        Some(_) => return Err("manifest.transform.params not an object".into()),
    };

    let parents = parents
        .into_iter()
        .map(|p| match p {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect();

    Ok(Some(ReplayPlan {
        parents,
        transform_digest,
        env_digest,
        runner,
        params,
    }))
}

/// Replay a node derivation.
///
/// Admission nodes (no parents) succeed immediately. `workdir` selects a
/// caller-supplied directory (never removed); otherwise a scratch directory
/// is created and removed afterwards unless `keep` is set.
///
/// Errors are returned only for failures to load the manifest itself;
/// everything downstream is reported through [`ReplayOutcome`].
pub fn replay_node(
    repo_root: &Path,
    node_id: &Digest,
    workdir: Option<&Path>,
    keep: bool,
) -> Result<ReplayOutcome, LedgerError> {
    let paths = LedgerPaths::new(repo_root);
    let manifest = read_node_manifest(&paths, node_id)?;

    let plan = match plan_from_manifest(&manifest) {
        Err(msg) => return Ok(ReplayOutcome::fail(vec![msg])),
        Ok(None) => {
            // Nothing to replay; the artifact is its own evidence.
            return Ok(ReplayOutcome {
                ok: true,
                errors: Vec::new(),
                output_digest: Some(*node_id),
                workdir: workdir.map(Path::to_path_buf),
            });
        }
        Ok(Some(plan)) => plan,
    };

    let transform_obj = paths.object_path(&plan.transform_digest);
    if !transform_obj.exists() {
        return Ok(ReplayOutcome::fail(vec![
            "missing transform definition in CAS".into(),
            format!("  expected: {}", transform_obj.display()),
            "  hint: ingest with --transform-file to store transform bytes".into(),
        ]));
    }

    if let Some(env_digest) = &plan.env_digest {
        let env_obj = paths.object_path(env_digest);
        if !env_obj.exists() {
            return Ok(ReplayOutcome::fail(vec![
                "missing environment description in CAS".into(),
                format!("  expected: {}", env_obj.display()),
                "  hint: store your lockfile/container recipe as a CAS blob".into(),
            ]));
        }
    }

    // Workdir management: caller-supplied directories persist; scratch
    // directories are cleaned on drop unless kept.
    let mut scratch = None;
    let wd: PathBuf = match workdir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            dir.to_path_buf()
        }
        None => {
            let tmp = tempfile::Builder::new()
                .prefix(&format!("ledger-replay-{}-", &node_id.to_hex()[..8]))
                .tempdir()?;
            let path = tmp.path().to_path_buf();
            scratch = Some(tmp);
            path
        }
    };

    let outcome = run_in_workdir(&paths, node_id, &plan, &wd)?;

    if let Some(tmp) = scratch {
        if keep {
            // Leak the directory deliberately; the caller asked to inspect it.
            let _ = tmp.keep();
        } else {
            drop(tmp);
            return Ok(ReplayOutcome {
                workdir: None,
                ..outcome
            });
        }
    }
    Ok(outcome)
}

fn run_in_workdir(
    paths: &LedgerPaths,
    node_id: &Digest,
    plan: &ReplayPlan,
    wd: &Path,
) -> Result<ReplayOutcome, LedgerError> {
    let parents_dir = wd.join("parents");
    fs::create_dir_all(&parents_dir)?;

    // Materialize parents in declared order; aggregate resolution failures
    // into a single report instead of stopping at the first.
    let mut errors = Vec::new();
    let mut parents_manifest = Vec::new();
    for (i, pid) in plan.parents.iter().enumerate() {
        if !is_hex_digest(pid) {
            errors.push(format!("invalid parent id: {pid:?}"));
            continue;
        }
        let parent_digest = match Digest::parse(pid) {
            Ok(d) => d,
            Err(e) => {
                errors.push(format!("invalid parent id: {pid:?} ({e})"));
                continue;
            }
        };
        let parent_obj = paths.object_path(&parent_digest);
        if !parent_obj.exists() {
            errors.push(format!("missing parent object: {}", parent_obj.display()));
            continue;
        }
        let name = format!("{i:03}_{pid}.bin");
        fs::copy(&parent_obj, parents_dir.join(&name))?;
        parents_manifest.push(serde_json::json!({
            "index": i,
            "id": pid,
            "path": name,
        }));
    }
    if !errors.is_empty() {
        return Ok(ReplayOutcome::fail_in(wd, errors));
    }

    let mut parents_text = serde_json::to_string_pretty(&parents_manifest)?;
    parents_text.push('\n');
    fs::write(wd.join("parents.json"), parents_text)?;

    let mut params_text =
        String::from_utf8(canonical_json(&plan.params)?.into_vec()).map_err(|e| {
            LedgerError::Structural(format!("params not valid UTF-8 after canonicalization: {e}"))
        })?;
    params_text.push('\n');
    fs::write(wd.join("params.json"), params_text)?;

    // The digest in the file name makes inspection unambiguous.
    let transform_path = wd.join(format!("transform_{}.py", plan.transform_digest.to_hex()));
    fs::copy(paths.object_path(&plan.transform_digest), &transform_path)?;

    let out_path = wd.join("out.bin");

    let Some((program, prefix_args)) = plan.runner.split_first() else {
        return Ok(ReplayOutcome::fail_in(
            wd,
            vec!["manifest.transform.runner invalid (expected array[str])".into()],
        ));
    };
    let output = Command::new(program)
        .args(prefix_args)
        .arg(&transform_path)
        .arg("--parents-manifest")
        .arg(wd.join("parents.json"))
        .arg("--parents-dir")
        .arg(&parents_dir)
        .arg("--params-path")
        .arg(wd.join("params.json"))
        .arg("--out")
        .arg(&out_path)
        .current_dir(wd)
        .output();

    let output = match output {
        Ok(o) => o,
        Err(e) => {
            return Ok(ReplayOutcome::fail_in(
                wd,
                vec![format!("failed to spawn runner {program:?}: {e}")],
            ));
        }
    };

    if !output.status.success() {
        let mut errors = vec![format!(
            "transform failed (exit={})",
            output.status.code().unwrap_or(-1)
        )];
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            errors.push(format!("stdout:\n{}", stdout.trim_end_matches('\n')));
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            errors.push(format!("stderr:\n{}", stderr.trim_end_matches('\n')));
        }
        return Ok(ReplayOutcome::fail_in(wd, errors));
    }

    if !out_path.exists() {
        return Ok(ReplayOutcome::fail_in(
            wd,
            vec!["transform produced no output (missing out.bin)".into()],
        ));
    }

    let out_digest = sha256_file(&out_path)?;
    if out_digest != *node_id {
        return Ok(ReplayOutcome {
            ok: false,
            errors: vec![format!(
                "derivation mismatch: expected {}, got {}",
                node_id.to_hex(),
                out_digest.to_hex()
            )],
            output_digest: Some(out_digest),
            workdir: Some(wd.to_path_buf()),
        });
    }

    tracing::debug!(id = %node_id.to_hex(), "replay reproduced declared output");
    Ok(ReplayOutcome {
        ok: true,
        errors: Vec::new(),
        output_digest: Some(out_digest),
        workdir: Some(wd.to_path_buf()),
    })
}
