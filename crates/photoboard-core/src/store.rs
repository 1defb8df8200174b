//! Persistence of the most recent session identifier.
//!
//! Only the latest identifier matters. [`FileStore`] rewrites the whole file on
//! every save through a temp file and a rename, so a reader never observes a
//! half-written identifier.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::SessionId;

/// Where the latest identifier lives.
pub trait IdentifierStore: Send + Sync {
    /// Replace the stored identifier.
    fn save(&self, session_id: &SessionId) -> Result<()>;

    /// Read back the stored identifier, if any.
    fn load(&self) -> Result<Option<SessionId>>;
}

/// Identifier stored as raw bytes in a single file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn persist_err(&self, source: std::io::Error) -> Error {
        Error::Persist {
            path: self.path.clone(),
            source,
        }
    }
}

impl IdentifierStore for FileStore {
    fn save(&self, session_id: &SessionId) -> Result<()> {
        let temp_path = self.temp_path();

        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(session_id.as_bytes())?;
            file.sync_all()?;
            drop(file);
            fs::rename(&temp_path, &self.path)
        };

        if let Err(e) = write() {
            let _ = fs::remove_file(&temp_path);
            return Err(self.persist_err(e));
        }

        debug!(path = %self.path.display(), "persisted session identifier");
        Ok(())
    }

    fn load(&self) -> Result<Option<SessionId>> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => SessionId::new(bytes).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.persist_err(e)),
        }
    }
}

/// In-memory store that also keeps every identifier it was given.
#[derive(Debug, Default)]
pub struct MemoryStore {
    history: Mutex<Vec<SessionId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every saved identifier, oldest first.
    pub fn history(&self) -> Vec<SessionId> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl IdentifierStore for MemoryStore {
    fn save(&self, session_id: &SessionId) -> Result<()> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(session_id.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<SessionId>> {
        Ok(self
            .history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_latest_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        let store = FileStore::new(&path);

        store
            .save(&SessionId::try_from("a-much-longer-first-identifier").unwrap())
            .unwrap();
        store.save(&SessionId::try_from("short").unwrap()).unwrap();

        // Truncated, not merged.
        assert_eq!(fs::read(&path).unwrap(), b"short");
        assert_eq!(store.load().unwrap().unwrap().as_bytes(), b"short");
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn file_store_unwritable_dir_is_persist_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("missing").join("session"));

        let err = store
            .save(&SessionId::try_from("abc").unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::Persist { .. }));
    }

    #[test]
    fn memory_store_history() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        store.save(&SessionId::try_from("one").unwrap()).unwrap();
        store.save(&SessionId::try_from("two").unwrap()).unwrap();

        assert_eq!(store.history().len(), 2);
        assert_eq!(store.load().unwrap().unwrap().as_bytes(), b"two");
    }
}
