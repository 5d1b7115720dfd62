//! # verify and verify-reachable subcommands
//!
//! Prints `OK` and exits 0 on success; prints each error line to stderr and
//! exits 2 on verification failure.

use anyhow::{Context, Result};
use clap::Args;

use prov_core::Digest;
use prov_ledger::{verify_node, verify_reachable, VerifyReport};

use crate::repo_root_from_cwd;

/// Arguments for `prov verify` and `prov verify-reachable`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Node id (sha256, bare or prefixed).
    pub id: String,

    /// Also replay derivations (requires transform blobs in the CAS).
    #[arg(long)]
    pub replay: bool,
}

fn report_to_exit_code(report: &VerifyReport) -> u8 {
    if report.ok {
        println!("OK");
        0
    } else {
        for error in &report.errors {
            eprintln!("{error}");
        }
        2
    }
}

/// Execute the verify subcommand.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let repo_root = repo_root_from_cwd()?;
    let id = Digest::parse(&args.id).with_context(|| format!("invalid node id {:?}", args.id))?;
    let report = verify_node(&repo_root, &id, args.replay);
    Ok(report_to_exit_code(&report))
}

/// Execute the verify-reachable subcommand.
pub fn run_verify_reachable(args: &VerifyArgs) -> Result<u8> {
    let repo_root = repo_root_from_cwd()?;
    let id = Digest::parse(&args.id).with_context(|| format!("invalid node id {:?}", args.id))?;
    let report = verify_reachable(&repo_root, &id, args.replay);
    Ok(report_to_exit_code(&report))
}
