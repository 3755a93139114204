//! Local storage for the identity token
//!
//! The server does not issue sessions, so the client remembers which
//! identity it is (account id or guest token) and sends it on every
//! request. [`FileIdentityStore`] keeps it across restarts in a one-line
//! file; [`MemoryIdentityStore`] keeps it for the life of the process.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Where the client keeps its identity token
pub trait IdentityStore: Send + Sync {
    /// The stored token, `None` if nothing is stored
    fn load(&self) -> io::Result<Option<String>>;

    fn save(&self, identity: &str) -> io::Result<()>;

    /// Forgets the token (logout)
    fn clear(&self) -> io::Result<()>;
}

/// Process-local identity
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    identity: Mutex<Option<String>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that starts out holding `identity`
    pub fn with_identity(identity: impl Into<String>) -> Self {
        Self {
            identity: Mutex::new(Some(identity.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        // A panic elsewhere cannot leave an Option half-written
        self.identity.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.slot().clone())
    }

    fn save(&self, identity: &str) -> io::Result<()> {
        *self.slot() = Some(identity.to_string());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

/// Identity persisted in a single-line file
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let identity = contents.lines().next().unwrap_or("").trim();
                Ok((!identity.is_empty()).then(|| identity.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn save(&self, identity: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, format!("{}\n", identity))
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
