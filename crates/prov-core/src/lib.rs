//! # prov-core: foundational types for the Provenance Ledger Stack
//!
//! This crate is the bedrock of the workspace. It defines the byte-level
//! primitives every other crate agrees on: how values become canonical
//! bytes, how bytes become digests, and how strings are normalized before
//! either happens. Every other crate depends on `prov-core`; it depends on
//! nothing internal.
//!
//! ## Key design principles
//!
//! 1. **`CanonicalBytes` newtype.** ALL digest computation over structured
//!    values flows through `CanonicalBytes::new()`. No raw
//!    `serde_json::to_vec()` for digests. Ever. The inner buffer is private,
//!    so a value that skipped canonicalization cannot be hashed by mistake.
//!
//! 2. **`Digest` newtype for content identifiers.** 32 raw bytes with a
//!    validated constructor. Parsing accepts both the self-describing
//!    `sha256:<hex>` form and the bare 64-hex form used as filesystem names.
//!    No bare strings for identifiers.
//!
//! 3. **Normalization is policy-free.** `normalize_string` applies Unicode
//!    NFC and nothing else. Trimming, casing, and locale behavior belong to
//!    callers.
//!
//! ## Crate policy
//!
//! - No dependencies on other `prov-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod strings;

pub use canonical::{canonical_json, CanonicalBytes};
pub use digest::{is_hex_digest, sha256_file, sha256_hex, sha256_prefixed, Digest};
pub use error::{CanonicalError, DigestParseError};
pub use strings::normalize_string;
