//! # Error types
//!
//! Structured errors for the foundational layer. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations, and carry enough
//! context to diagnose the failing input without a debugger.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalError {
    /// JSON serialization failed.
    #[error("canonical serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error parsing a digest string.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DigestParseError {
    /// Hex part is not exactly 64 characters.
    #[error("digest must be 64 hex chars, got {0}")]
    BadLength(usize),

    /// Hex part contains a non-hexadecimal character.
    #[error("digest contains non-hex characters")]
    NonHex,

    /// A prefixed form named an algorithm other than sha256.
    #[error("unsupported digest prefix: {0:?}")]
    BadPrefix(String),
}
