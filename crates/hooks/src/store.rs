//! Where markup files live.

use crate::error::{HookError, Result};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Text storage addressed by path.
pub trait MarkupStore: Send + Sync {
    /// Reads the whole file at `path`.
    fn read_text(&self, path: &Path) -> Result<String>;

    /// Replaces the file at `path` with `text`.
    fn write_text(&self, path: &Path, text: &str) -> Result<()>;
}

/// Local filesystem store. Writes go to a temp file next to the target and
/// are renamed into place.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl MarkupStore for FsStore {
    fn read_text(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|source| HookError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_text(&self, path: &Path, text: &str) -> Result<()> {
        let io_error = |source| HookError::Io {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(io_error)?;

        let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
        file.write_all(text.as_bytes()).map_err(io_error)?;
        file.flush().map_err(io_error)?;
        file.persist(path).map_err(|source| HookError::Persist {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}

/// In-memory store, handy for hosts that keep markup elsewhere and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<PathBuf, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text at `path`, if any.
    pub fn get(&self, path: &Path) -> Option<String> {
        self.files
            .lock()
            .ok()
            .and_then(|files| files.get(path).cloned())
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.lock().map(|files| files.len()).unwrap_or(0)
    }

    /// True when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MarkupStore for MemoryStore {
    fn read_text(&self, path: &Path) -> Result<String> {
        self.get(path).ok_or_else(|| HookError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such markup file"),
        })
    }

    fn write_text(&self, path: &Path, text: &str) -> Result<()> {
        let mut files = self.files.lock().map_err(|_| HookError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::other("memory store lock poisoned"),
        })?;
        files.insert(path.to_path_buf(), text.to_string());
        Ok(())
    }
}
