//! # refs subcommand
//!
//! Mutable convenience refs: named pointers into the immutable DAG.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use prov_core::Digest;
use prov_ledger::{get_ref, set_ref, LedgerPaths};

use crate::repo_root_from_cwd;

/// Arguments for `prov refs`.
#[derive(Args, Debug)]
pub struct RefsArgs {
    #[command(subcommand)]
    pub command: RefsCommand,
}

/// Refs subcommands.
#[derive(Subcommand, Debug)]
pub enum RefsCommand {
    /// Set a ref to a node id.
    Set {
        /// Ref name.
        name: String,
        /// Node id (sha256, bare or prefixed).
        id: String,
    },
    /// Print the node id a ref points at.
    Get {
        /// Ref name.
        name: String,
    },
}

/// Execute the refs subcommand.
pub fn run_refs(args: &RefsArgs) -> Result<u8> {
    let repo_root = repo_root_from_cwd()?;
    let paths = LedgerPaths::new(&repo_root);

    match &args.command {
        RefsCommand::Set { name, id } => {
            let id = Digest::parse(id).with_context(|| format!("invalid node id {id:?}"))?;
            set_ref(&paths, name, &id)?;
            Ok(0)
        }
        RefsCommand::Get { name } => {
            let id = get_ref(&paths, name)?;
            println!("{}", id.to_hex());
            Ok(0)
        }
    }
}
