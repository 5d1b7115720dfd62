//! # Ingest session lock
//!
//! A repository-wide, cross-process, exclusive advisory lock covering the
//! ingest window (compute digest, store blob, write manifest). The lock is
//! taken through the OS kernel (`flock` on POSIX, `LockFileEx` on Windows,
//! via `fs2`), so it is honored across processes and released automatically
//! when the holder dies: lock lifetime is tied to the open descriptor.
//!
//! ## Enablement policy
//!
//! Maximal-safety default: ON. Disabled only by an explicit caller opt-out
//! flag or by setting `LEDGER_INGEST_SESSION_LOCK` to a recognized falsey
//! value. Unset or unrecognized values mean ON. The environment is read at
//! every decision point, never cached.

use std::fs;
use std::fs::File;

use fs2::FileExt;

use crate::cas::LedgerPaths;
use crate::error::LedgerError;

/// Environment variable toggling the ingest session lock.
///
/// Truthy values: `1`, `true`, `yes`, `y`, `on`. Falsey values: `0`,
/// `false`, `no`, `n`, `off`. Both case-insensitive, whitespace-trimmed.
pub const SESSION_LOCK_ENV_VAR: &str = "LEDGER_INGEST_SESSION_LOCK";

fn truthy(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn falsey(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "n" | "off"
    )
}

/// Decide whether ingest should take the session lock.
///
/// `no_session_lock` is the caller's explicit opt-out (e.g. a CLI flag) and
/// wins outright. Otherwise the environment variable decides; unknown
/// values default to ON.
pub fn session_lock_enabled(no_session_lock: bool) -> bool {
    if no_session_lock {
        return false;
    }

    match std::env::var(SESSION_LOCK_ENV_VAR) {
        Err(_) => true,
        Ok(v) => {
            if truthy(&v) {
                true
            } else if falsey(&v) {
                false
            } else {
                true
            }
        }
    }
}

/// An exclusive hold on the repo-wide ingest session lock.
///
/// Acquiring blocks until any other holder releases. The lock is released
/// on drop; if the process dies first, the OS releases it.
#[derive(Debug)]
pub struct SessionLock {
    file: File,
}

impl SessionLock {
    /// Block until the exclusive lock is held.
    pub fn acquire(paths: &LedgerPaths) -> Result<Self, LedgerError> {
        let file = Self::open_lock_file(paths)?;
        file.lock_exclusive()?;
        tracing::debug!(path = %paths.session_lock_path().display(), "session lock acquired");
        Ok(Self { file })
    }

    /// Take the lock only if it is immediately available.
    ///
    /// Returns `Ok(None)` when another process holds it.
    pub fn try_acquire(paths: &LedgerPaths) -> Result<Option<Self>, LedgerError> {
        let file = Self::open_lock_file(paths)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file })),
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn open_lock_file(paths: &LedgerPaths) -> Result<File, LedgerError> {
        let path = paths.session_lock_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(fs::OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)?)
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        // Descriptor teardown would release the lock anyway; unlocking
        // explicitly keeps the release point deterministic.
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state; serialize them.
    static ENV_GUARD: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn with_env<R>(value: Option<&str>, f: impl FnOnce() -> R) -> R {
        let _guard = ENV_GUARD.lock().unwrap();
        match value {
            Some(v) => std::env::set_var(SESSION_LOCK_ENV_VAR, v),
            None => std::env::remove_var(SESSION_LOCK_ENV_VAR),
        }
        let out = f();
        std::env::remove_var(SESSION_LOCK_ENV_VAR);
        out
    }

    #[test]
    fn enabled_by_default() {
        with_env(None, || assert!(session_lock_enabled(false)));
    }

    #[test]
    fn explicit_opt_out_wins() {
        with_env(Some("true"), || assert!(!session_lock_enabled(true)));
    }

    #[test]
    fn falsey_values_disable() {
        for v in ["0", "false", "no", "n", "off", " OFF ", "No"] {
            with_env(Some(v), || {
                assert!(!session_lock_enabled(false), "value {v:?} should disable")
            });
        }
    }

    #[test]
    fn truthy_and_unrecognized_values_enable() {
        for v in ["1", "true", "YES", "on", "maybe", "", "2"] {
            with_env(Some(v), || {
                assert!(session_lock_enabled(false), "value {v:?} should enable")
            });
        }
    }

    #[test]
    fn env_is_read_each_call() {
        with_env(Some("off"), || {
            assert!(!session_lock_enabled(false));
            std::env::set_var(SESSION_LOCK_ENV_VAR, "on");
            assert!(session_lock_enabled(false));
        });
    }

    #[test]
    fn acquire_creates_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LedgerPaths::new(dir.path());
        let lock = SessionLock::acquire(&paths).unwrap();
        assert!(paths.session_lock_path().exists());
        drop(lock);
    }

    #[test]
    fn reacquire_after_drop() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LedgerPaths::new(dir.path());
        drop(SessionLock::acquire(&paths).unwrap());
        // A released lock is immediately available again.
        let second = SessionLock::try_acquire(&paths).unwrap();
        assert!(second.is_some());
    }
}
