//! # prov-kernel: the phase-constrained proof kernel
//!
//! A small execution checker that re-evaluates typed steps over a
//! content-addressed memory DAG, checks monitor predicates after each step,
//! and mints receipts binding an output to a pinned law hash.
//!
//! ## Moving parts
//!
//! - [`MemoryStore`]: in-memory Merkle-DAG node store. A node's hash covers
//!   its data digest and its ordered parent hashes; `put` is idempotent.
//! - [`Step`] / [`Proof`]: the typed claims a caller submits. Every step
//!   declares its inputs and the output hash it expects re-evaluation to
//!   produce.
//! - [`Critic`]: replays each step's deterministic evaluation, compares the
//!   recomputed output hash against the declaration, and offers an
//!   observation event to every monitor. Failures are deterministic string
//!   codes, not errors.
//! - [`Controller`]: holds the current phase, submits proofs to the critic,
//!   and on acceptance mints a [`Receipt`] stored back into the DAG,
//!   chained to the proof's final output.
//!
//! ## Concurrency
//!
//! Single-threaded, in-process. A `MemoryStore` is not inherently
//! thread-safe; external coordination is the embedder's responsibility.

pub mod controller;
pub mod critic;
pub mod error;
pub mod law;
pub mod memory;
pub mod monitor;
pub mod step;

pub use controller::{Controller, Receipt};
pub use critic::{Critic, Verdict, VerdictCode};
pub use error::KernelError;
pub use law::{allowed_step_types, law_bundle, law_hash};
pub use memory::{MemNode, MemoryStore};
pub use monitor::{HiddenPremiseMonitor, Monitor, Norms, ObsEvent, PhaseAllowlistMonitor};
pub use step::{Phase, Proof, Step, StepType};
