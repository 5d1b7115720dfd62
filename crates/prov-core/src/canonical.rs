//! # Canonical serialization
//!
//! Defines `CanonicalBytes`, the sole construction path for bytes used in
//! digest computation over structured values.
//!
//! ## Encoding
//!
//! RFC 8785 (JSON Canonicalization Scheme) via `serde_jcs`:
//!
//! - object keys sorted
//! - compact separators, no inter-token whitespace
//! - UTF-8 output, non-ASCII characters preserved unescaped
//!
//! Numbers serialize with the JCS shortest-round-trip rendering. NaN and
//! Infinity cannot enter through `serde_json::Value` and are not handled
//! here; float canonicalization policy, if a domain needs one, must be
//! pinned upstream of this layer.
//!
//! ## Construction invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is through the canonicalization pipeline, so any function
//! that requires canonical bytes for digest computation can demand
//! `&CanonicalBytes` in its signature and be certain of what it receives.

use serde::Serialize;

use crate::error::CanonicalError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - The only constructor is `CanonicalBytes::new()`.
/// - Object keys are sorted; there is no inter-token whitespace.
/// - The buffer is valid UTF-8 with non-ASCII characters unescaped.
///
/// The inner `Vec<u8>` is private, so downstream code cannot violate these.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// This is the ONLY way to construct `CanonicalBytes`. All digest
    /// computation over structured values must flow through here.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalError` if the value does not serialize to JSON.
    pub fn new(value: &impl Serialize) -> Result<Self, CanonicalError> {
        let s = serde_jcs::to_string(value)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume and return the underlying buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Canonicalize a serializable value.
///
/// Free-function convenience over [`CanonicalBytes::new`].
pub fn canonical_json(value: &impl Serialize) -> Result<CanonicalBytes, CanonicalError> {
    CanonicalBytes::new(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_object_sorted_compact() {
        let data = serde_json::json!({"b": 2, "a": 1, "c": "hello"});
        let cb = CanonicalBytes::new(&data).expect("should canonicalize");
        assert_eq!(cb.as_bytes(), br#"{"a":1,"b":2,"c":"hello"}"#);
    }

    #[test]
    fn nested_objects_sorted() {
        let data = serde_json::json!({
            "outer": {"b": 2, "a": 1},
            "list": [3, 2, 1]
        });
        let cb = CanonicalBytes::new(&data).expect("should canonicalize");
        assert_eq!(cb.as_bytes(), br#"{"list":[3,2,1],"outer":{"a":1,"b":2}}"#);
    }

    #[test]
    fn floats_pass_through() {
        let data = serde_json::json!({"ratio": 0.5});
        let cb = CanonicalBytes::new(&data).expect("floats are passed through");
        assert_eq!(cb.as_bytes(), br#"{"ratio":0.5}"#);
    }

    #[test]
    fn unicode_preserved_unescaped() {
        let data = serde_json::json!({"name": "\u{00e9}\u{00e8}\u{00ea}"});
        let cb = CanonicalBytes::new(&data).expect("unicode should pass through");
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert!(s.contains('\u{00e9}'));
        assert!(!s.contains("\\u"));
    }

    #[test]
    fn empty_object_and_array() {
        assert_eq!(
            CanonicalBytes::new(&serde_json::json!({})).unwrap().as_bytes(),
            b"{}"
        );
        assert_eq!(
            CanonicalBytes::new(&serde_json::json!([])).unwrap().as_bytes(),
            b"[]"
        );
    }

    #[test]
    fn scalars() {
        assert_eq!(CanonicalBytes::new(&"hi").unwrap().as_bytes(), b"\"hi\"");
        assert_eq!(CanonicalBytes::new(&42i64).unwrap().as_bytes(), b"42");
        assert_eq!(CanonicalBytes::new(&true).unwrap().as_bytes(), b"true");
        assert_eq!(
            CanonicalBytes::new(&serde_json::Value::Null).unwrap().as_bytes(),
            b"null"
        );
    }

    #[test]
    fn round_trip_is_byte_identical() {
        let data = serde_json::json!({"z": [1, {"b": null, "a": "x"}], "a": -7});
        let first = CanonicalBytes::new(&data).unwrap();
        let decoded: serde_json::Value = serde_json::from_slice(first.as_bytes()).unwrap();
        let second = CanonicalBytes::new(&decoded).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn free_function_matches_constructor() {
        let data = serde_json::json!({"k": "v"});
        assert_eq!(
            canonical_json(&data).unwrap(),
            CanonicalBytes::new(&data).unwrap()
        );
    }
}
