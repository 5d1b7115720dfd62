//! # Canonical string handling
//!
//! Deterministic normalization primitives usable by higher layers without
//! importing policy. The scope is deliberately narrow: Unicode NFC and
//! nothing else. No trimming, case folding, or locale behavior is
//! introduced at this layer.

use unicode_normalization::UnicodeNormalization;

/// Return the NFC normalization of `s`.
///
/// Idempotent: `normalize_string(normalize_string(s)) == normalize_string(s)`.
pub fn normalize_string(s: &str) -> String {
    s.nfc().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_combining_sequences() {
        // "e" + COMBINING ACUTE ACCENT composes to U+00E9.
        assert_eq!(normalize_string("e\u{301}"), "\u{e9}");
    }

    #[test]
    fn ascii_unchanged() {
        assert_eq!(normalize_string("hello world"), "hello world");
    }

    #[test]
    fn no_trimming_or_casing() {
        assert_eq!(normalize_string("  MiXeD  "), "  MiXeD  ");
    }

    #[test]
    fn idempotent() {
        let inputs = ["e\u{301}", "\u{e9}", "a\u{30a}b\u{301}", "", "plain"];
        for s in inputs {
            let once = normalize_string(s);
            assert_eq!(normalize_string(&once), once);
        }
    }
}
