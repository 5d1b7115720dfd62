//! # Convenience refs
//!
//! Mutable name-to-node pointers under `<root>/ledger/refs/<name>`. Refs
//! are the one deliberately mutable surface of the ledger: they point into
//! the immutable DAG without being part of it. A ref file holds the bare
//! 64-hex node id followed by a newline.

use prov_core::Digest;

use crate::cas::LedgerPaths;
use crate::error::LedgerError;

/// A ref name must stay inside the refs directory.
fn validate_ref_name(name: &str) -> Result<(), LedgerError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');
    if bad {
        return Err(LedgerError::InvalidRefName(name.to_string()));
    }
    Ok(())
}

/// Point `name` at a node id, creating or overwriting the ref.
pub fn set_ref(paths: &LedgerPaths, name: &str, id: &Digest) -> Result<(), LedgerError> {
    validate_ref_name(name)?;
    std::fs::create_dir_all(paths.refs_dir())?;
    std::fs::write(paths.ref_path(name), format!("{}\n", id.to_hex()))?;
    Ok(())
}

/// Resolve a ref to the node id it points at.
pub fn get_ref(paths: &LedgerPaths, name: &str) -> Result<Digest, LedgerError> {
    validate_ref_name(name)?;
    let path = paths.ref_path(name);
    let text = match std::fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LedgerError::MissingRef(path));
        }
        Err(e) => return Err(e.into()),
    };
    Digest::parse(text.trim())
        .map_err(|e| LedgerError::Structural(format!("ref {name:?} does not hold a node id: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LedgerPaths::new(dir.path());
        let id = Digest::of(b"hello");

        set_ref(&paths, "latest", &id).unwrap();
        assert_eq!(get_ref(&paths, "latest").unwrap(), id);

        // On-disk form is bare hex plus newline.
        let raw = std::fs::read_to_string(paths.ref_path("latest")).unwrap();
        assert_eq!(raw, format!("{}\n", id.to_hex()));
    }

    #[test]
    fn refs_are_mutable() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LedgerPaths::new(dir.path());

        set_ref(&paths, "head", &Digest::of(b"one")).unwrap();
        set_ref(&paths, "head", &Digest::of(b"two")).unwrap();
        assert_eq!(get_ref(&paths, "head").unwrap(), Digest::of(b"two"));
    }

    #[test]
    fn missing_ref_errors() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LedgerPaths::new(dir.path());
        assert!(matches!(
            get_ref(&paths, "absent"),
            Err(LedgerError::MissingRef(_))
        ));
    }

    #[test]
    fn escaping_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LedgerPaths::new(dir.path());
        let id = Digest::of(b"x");
        for name in ["", ".", "..", "a/b", "a\\b"] {
            assert!(
                matches!(set_ref(&paths, name, &id), Err(LedgerError::InvalidRefName(_))),
                "name {name:?} should be rejected"
            );
        }
    }

    #[test]
    fn corrupt_ref_content_is_structural() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LedgerPaths::new(dir.path());
        std::fs::create_dir_all(paths.refs_dir()).unwrap();
        std::fs::write(paths.ref_path("weird"), "not a digest\n").unwrap();
        assert!(matches!(
            get_ref(&paths, "weird"),
            Err(LedgerError::Structural(_))
        ));
    }
}
