//! # Kernel error types
//!
//! Hard failures of the kernel machinery itself. Verification outcomes are
//! never errors: the critic reports those as deterministic codes (see
//! [`crate::critic::VerdictCode`]).

use thiserror::Error;

/// Errors from proof-kernel operations.
#[derive(Error, Debug)]
pub enum KernelError {
    /// A memory-DAG node hash is not present in the store.
    #[error("memory node not found: {0}")]
    NotFound(String),

    /// Canonicalization of kernel-internal structures failed.
    #[error(transparent)]
    Canonical(#[from] prov_core::CanonicalError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_hash() {
        let err = KernelError::NotFound("deadbeef".into());
        assert!(format!("{err}").contains("deadbeef"));
    }
}
