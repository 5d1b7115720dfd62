//! # replay subcommand
//!
//! Replays a node derivation and verifies the output hash. `--workdir`
//! materializes inputs and output in a caller-chosen directory for
//! debugging; `--keep` preserves an auto-created scratch directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use prov_core::Digest;
use prov_ledger::replay_node;

use crate::repo_root_from_cwd;

/// Arguments for `prov replay`.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Node id (sha256, bare or prefixed).
    pub id: String,

    /// Directory to materialize inputs/output in (useful for debugging).
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Keep the workdir (when using an auto-temp dir) after replay.
    #[arg(long)]
    pub keep: bool,
}

/// Execute the replay subcommand.
pub fn run_replay(args: &ReplayArgs) -> Result<u8> {
    let repo_root = repo_root_from_cwd()?;
    let id = Digest::parse(&args.id).with_context(|| format!("invalid node id {:?}", args.id))?;

    let outcome = replay_node(&repo_root, &id, args.workdir.as_deref(), args.keep)?;
    if outcome.ok {
        println!("OK");
        Ok(0)
    } else {
        for error in &outcome.errors {
            eprintln!("{error}");
        }
        Ok(2)
    }
}
