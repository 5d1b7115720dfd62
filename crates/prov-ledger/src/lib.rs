//! # prov-ledger: the append-only provenance ledger
//!
//! An append-only, content-addressed ledger of artifacts and their
//! derivations. Each ingested byte string is identified by its SHA-256
//! digest; each derivation is described by an immutable node manifest
//! recording parents, a transform pinned by digest, its parameters, the
//! runner contract, and optionally the digest of its execution environment.
//!
//! ## Persisted layout
//!
//! ```text
//! <repo-root>/ledger/objects/<xx>/<64-hex>      content blob
//! <repo-root>/ledger/nodes/<64-hex>.json        immutable manifest
//! <repo-root>/ledger/refs/<name>                mutable convenience ref
//! <repo-root>/ledger/.locks/ingest.lock         cross-process lock file
//! ```
//!
//! ## Integrity invariants
//!
//! - A node manifest, once written, is never modified or deleted; a second
//!   write to the same id fails.
//! - The CAS path of an object is derived from its digest, and the bytes at
//!   that path hash to that digest.
//! - Every parent id referenced by a manifest has a manifest of its own.
//! - A node with no parents is an admission node: externally supplied, not
//!   replayable, and its transform digest need not resolve to a CAS blob.
//!
//! ## Concurrency
//!
//! The ledger is synchronous and single-threaded per caller. Cross-process
//! ingest is serialized by an OS advisory lock (see [`lock`]); concurrent
//! stores of the same digest are safe via atomic rename; readers racing
//! writers observe missing objects or manifests as verification errors, not
//! corruption.

pub mod cas;
pub mod error;
pub mod ingest;
pub mod lock;
pub mod manifest;
pub mod refs;
pub mod replay;
pub mod verify;

pub use cas::{store_blob, LedgerPaths};
pub use error::LedgerError;
pub use ingest::{ingest_artifact, IngestRequest};
pub use lock::{session_lock_enabled, SessionLock, SESSION_LOCK_ENV_VAR};
pub use manifest::{
    read_node_manifest, write_node_manifest, Node, RunnerSpec, Transform,
};
pub use refs::{get_ref, set_ref};
pub use replay::{replay_node, ReplayOutcome, DEFAULT_RUNNER};
pub use verify::{verify_node, verify_reachable, VerifyReport};
