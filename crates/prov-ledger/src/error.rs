//! # Ledger error types
//!
//! One error enum for the fallible ledger operations. Verification and
//! replay additionally accumulate per-node diagnostics inside their report
//! structs; the variants here cover the hard failures that abort an
//! operation outright.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A manifest field has the wrong shape (wrong type, wrong length,
    /// missing required field).
    #[error("structural error: {0}")]
    Structural(String),

    /// Bytes do not hash to their claimed digest.
    #[error("integrity error: expected {expected}, got {observed}")]
    Integrity {
        /// The digest the bytes were claimed to have.
        expected: String,
        /// The digest the bytes actually have.
        observed: String,
    },

    /// A required file is absent.
    #[error("missing {what}: {}{}", .path.display(), render_hint(.hint))]
    Missing {
        /// What kind of thing is missing (manifest, object, source file, ...).
        what: &'static str,
        /// Where it was expected.
        path: PathBuf,
        /// Optional remediation hint.
        hint: Option<String>,
    },

    /// Attempt to write a node manifest that already exists.
    #[error("node manifest already exists: {}", .0.display())]
    ManifestExists(PathBuf),

    /// A named ref does not exist.
    #[error("missing ref: {}", .0.display())]
    MissingRef(PathBuf),

    /// A ref name would escape the refs directory.
    #[error("invalid ref name: {0:?}")]
    InvalidRefName(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse or serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Canonicalization failure.
    #[error(transparent)]
    Canonical(#[from] prov_core::CanonicalError),
}

fn render_hint(hint: &Option<String>) -> String {
    match hint {
        Some(h) => format!("\n  hint: {h}"),
        None => String::new(),
    }
}
