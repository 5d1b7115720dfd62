//! # ingest subcommand
//!
//! Admits an artifact: stores its bytes in the CAS and writes the immutable
//! node manifest, all inside the session-lock window unless opted out. On
//! success the artifact id is printed to stdout.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use prov_core::Digest;
use prov_ledger::{ingest_artifact, IngestRequest, RunnerSpec};

use crate::repo_root_from_cwd;

/// Arguments for `prov ingest`.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// File whose bytes become the artifact.
    pub path: PathBuf,

    /// Parent node id (sha256). May be repeated; order is semantic.
    #[arg(long = "parent")]
    pub parents: Vec<String>,

    /// Transform name/identifier (hashed if no transform file).
    #[arg(long)]
    pub transform: Option<String>,

    /// Path to the transform definition file; its digest pins the transform.
    #[arg(long)]
    pub transform_file: Option<PathBuf>,

    /// Replay runner command prefix (repeatable), e.g. --runner python3 --runner -I.
    #[arg(long = "runner")]
    pub runner: Vec<String>,

    /// sha256 of the execution environment description (lockfile, recipe).
    #[arg(long)]
    pub env_digest: Option<String>,

    /// JSON object of semantic params (canonical).
    #[arg(long)]
    pub params_json: Option<String>,

    /// Non-semantic note.
    #[arg(long)]
    pub note: Option<String>,

    /// Disable the repo-wide ingest-session lock (not recommended).
    #[arg(long)]
    pub no_session_lock: bool,
}

/// Execute the ingest subcommand.
pub fn run_ingest(args: &IngestArgs) -> Result<u8> {
    let repo_root = repo_root_from_cwd()?;

    let parents = args
        .parents
        .iter()
        .map(|p| Digest::parse(p).with_context(|| format!("invalid --parent {p:?}")))
        .collect::<Result<Vec<_>>>()?;

    let env_digest = args
        .env_digest
        .as_deref()
        .map(|d| Digest::parse(d).with_context(|| format!("invalid --env-digest {d:?}")))
        .transpose()?;

    let params = match &args.params_json {
        None => serde_json::Map::new(),
        Some(raw) => {
            let value: serde_json::Value =
                serde_json::from_str(raw).context("parsing --params-json")?;
            match value {
                serde_json::Value::Object(map) => map,
                _ => bail!("--params-json must decode to a JSON object"),
            }
        }
    };

    let runner = if args.runner.is_empty() {
        None
    } else {
        Some(RunnerSpec::Argv(args.runner.clone()))
    };

    let request = IngestRequest {
        source: args.path.clone(),
        parents,
        transform_name: args.transform.clone(),
        transform_file: args.transform_file.clone(),
        runner,
        env_digest,
        params,
        note: args.note.clone(),
        no_session_lock: args.no_session_lock,
    };

    let artifact_id = ingest_artifact(&repo_root, &request)?;
    println!("{}", artifact_id.to_hex());
    Ok(0)
}
