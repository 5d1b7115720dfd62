//! # prov CLI entry point
//!
//! Parses command-line arguments and dispatches to verb handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use prov_cli::hash::{run_hash, HashArgs};
use prov_cli::ingest::{run_ingest, IngestArgs};
use prov_cli::refs::{run_refs, RefsArgs};
use prov_cli::replay::{run_replay, ReplayArgs};
use prov_cli::verify::{run_verify, run_verify_reachable, VerifyArgs};

/// Provenance ledger CLI.
///
/// Stores artifacts by content digest, records their derivations as
/// immutable node manifests, and verifies or replays them on demand.
#[derive(Parser, Debug)]
#[command(name = "prov", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the sha256 of a file.
    Hash(HashArgs),

    /// Store an artifact and write its immutable node manifest (append-only).
    Ingest(IngestArgs),

    /// Verify a node: object hash and parent reachability, optional replay.
    Verify(VerifyArgs),

    /// Verify a node and all reachable ancestors, optional replay.
    VerifyReachable(VerifyArgs),

    /// Replay a node derivation and verify the output hash.
    Replay(ReplayArgs),

    /// Manage mutable convenience refs.
    Refs(RefsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    // stdout is reserved for command output (ids, OK); logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("prov CLI starting");

    let result = match cli.command {
        Commands::Hash(args) => run_hash(&args),
        Commands::Ingest(args) => run_ingest(&args),
        Commands::Verify(args) => run_verify(&args),
        Commands::VerifyReachable(args) => run_verify_reachable(&args),
        Commands::Replay(args) => run_replay(&args),
        Commands::Refs(args) => run_refs(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
