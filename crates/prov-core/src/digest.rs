//! # Content digests
//!
//! Defines `Digest`, the content-addressed identifier used everywhere in
//! the stack: artifact ids, node ids, transform digests, environment
//! digests, memory-DAG hashes.
//!
//! ## Forms
//!
//! A digest has two textual forms:
//!
//! - `sha256:<64-hex>`: the self-describing form, produced by `Display` and
//!   `sha256_prefixed`. Used in records meant for human or cross-system
//!   consumption.
//! - bare `<64-hex>`: used for every filesystem name (CAS object paths,
//!   manifest file names) and accepted everywhere a node identifier is.
//!
//! The prefix is never written to disk paths. Parsing accepts either form.

use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::DigestParseError;

/// Streaming chunk size for file hashing.
const CHUNK_SIZE: usize = 1024 * 1024;

/// A SHA-256 content digest.
///
/// Serializes as the bare 64-hex string (the filesystem / manifest form);
/// deserialization accepts either the bare or the `sha256:`-prefixed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Digest of a byte string.
    pub fn of(data: &[u8]) -> Self {
        let mut h = Sha256::new();
        h.update(data);
        Self(h.finalize().into())
    }

    /// Digest of canonical bytes.
    ///
    /// The signature demands `CanonicalBytes`, so every structured value
    /// hashed through here went through the canonicalization pipeline.
    pub fn of_canonical(canonical: &CanonicalBytes) -> Self {
        Self::of(canonical.as_bytes())
    }

    /// Parse a digest from either textual form.
    ///
    /// Accepts `sha256:<64-hex>` or bare `<64-hex>`; surrounding whitespace
    /// is trimmed and hex digits are lowercased.
    pub fn parse(s: &str) -> Result<Self, DigestParseError> {
        let s = s.trim();
        let hex = match s.split_once(':') {
            Some(("sha256", rest)) => rest,
            Some((prefix, _)) => {
                return Err(DigestParseError::BadPrefix(prefix.to_string()));
            }
            None => s,
        };
        if hex.len() != 64 {
            return Err(DigestParseError::BadLength(hex.len()));
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DigestParseError::NonHex);
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk).map_err(|_| DigestParseError::NonHex)?;
            bytes[i] = u8::from_str_radix(pair, 16).map_err(|_| DigestParseError::NonHex)?;
        }
        Ok(Self(bytes))
    }

    /// The raw 32 digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as bare lowercase hex (the filesystem form).
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// First two hex characters, used to shard CAS directories.
    pub fn shard_prefix(&self) -> String {
        format!("{:02x}", self.0[0])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

impl std::str::FromStr for Digest {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// SHA-256 of a file's bytes, streamed in 1 MiB chunks.
pub fn sha256_file(path: &Path) -> std::io::Result<Digest> {
    let mut f = std::fs::File::open(path)?;
    let mut h = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        h.update(&buf[..n]);
    }
    Ok(Digest::from_bytes(h.finalize().into()))
}

/// Bare lowercase hex digest of a byte string.
pub fn sha256_hex(data: &[u8]) -> String {
    Digest::of(data).to_hex()
}

/// Self-describing `sha256:<hex>` digest of a byte string.
pub fn sha256_prefixed(data: &[u8]) -> String {
    Digest::of(data).to_string()
}

/// True if `s` is exactly 64 lowercase hex characters.
///
/// This is the structural check manifest consumers apply to dynamic fields
/// before treating them as digests.
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
