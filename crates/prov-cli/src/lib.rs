//! # prov-cli: command-line surface of the Provenance Ledger Stack
//!
//! Thin verb handlers over `prov-ledger`. Each submodule owns one verb:
//! its clap `Args` struct and a `run_<verb>` function returning the process
//! exit code.
//!
//! ## Exit codes
//!
//! - `0`: success (`OK` on verification verbs, the artifact id on ingest)
//! - `2`: verification failure, error lines on stderr
//! - `1`: structural errors (bad arguments, missing files, append-only
//!   violations), reported through `anyhow`

use std::path::PathBuf;

use anyhow::{bail, Result};

pub mod hash;
pub mod ingest;
pub mod refs;
pub mod replay;
pub mod verify;

/// Locate the repository root by walking up from the current directory
/// until a `ledger/` directory appears (20 levels max).
pub fn repo_root_from_cwd() -> Result<PathBuf> {
    let mut dir = std::env::current_dir()?;
    for _ in 0..20 {
        if dir.join("ledger").is_dir() {
            return Ok(dir);
        }
        let Some(parent) = dir.parent() else { break };
        dir = parent.to_path_buf();
    }
    bail!("could not find repo root (missing ./ledger directory); run inside the repo");
}
