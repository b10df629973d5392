use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tempfile::NamedTempFile;

/// Error type for durable storage writes
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("could not encode storage: {0}")]
    EncodeError(#[from] serde_json::Error),
    #[error("storage is read-only")]
    ReadOnly,
}

/// A flat string-to-string namespace that survives between runs.
///
/// Every write is durable when it returns `Ok`. Values are opaque text;
/// callers that store structured data encode it as JSON themselves.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// Key-value store kept as a single JSON object file. Key order is kept
/// stable across writes so the file diffs cleanly.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: IndexMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store. A file
    /// that is not a JSON object of strings is moved aside to `<path>.bak`
    /// and the store starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(FileStore {
                    path,
                    entries: IndexMap::new(),
                });
            }
            Err(e) => return Err(StorageError::ReadError { path, source: e }),
        };

        let entries = match serde_json::from_str::<IndexMap<String, String>>(&text) {
            Ok(entries) => entries,
            Err(e) => {
                let backup = backup_path(&path);
                tracing::warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    error = %e,
                    "storage file unreadable, starting empty"
                );
                fs::rename(&path, &backup).map_err(|e| StorageError::WriteError {
                    path: backup.clone(),
                    source: e,
                })?;
                IndexMap::new()
            }
        };
        Ok(FileStore { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(&self.entries)?;
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(|e| StorageError::WriteError {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
        atomic_write(&self.path, content.as_bytes()).map_err(|e| StorageError::WriteError {
            path: self.path.clone(),
            source: e,
        })?;
        tracing::debug!(path = %self.path.display(), keys = self.entries.len(), "storage flushed");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.shift_remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Store that lives only as long as the value. Used by tests and by
/// callers that want a scratch store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: IndexMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes all fail with `StorageError::ReadOnly`.
    pub fn read_only(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        MemoryStore {
            entries: entries.into_iter().collect(),
            read_only: true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        self.entries.shift_remove(key);
        Ok(())
    }
}
