//! # hash subcommand
//!
//! Prints the bare-hex sha256 of a file. Works anywhere; no repository
//! required.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use prov_core::sha256_file;

/// Arguments for `prov hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// File to hash.
    pub path: PathBuf,
}

/// Execute the hash subcommand.
pub fn run_hash(args: &HashArgs) -> Result<u8> {
    if !args.path.exists() {
        bail!("no such file: {}", args.path.display());
    }
    let digest = sha256_file(&args.path)
        .with_context(|| format!("hashing {}", args.path.display()))?;
    println!("{}", digest.to_hex());
    Ok(0)
}
