//! Checkpoint persistence.
//!
//! A [`CheckpointStore`] is a flat namespace of named payloads. Names
//! follow [`CheckpointLayout`](crate::layout::CheckpointLayout).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use lithos_types::{LithosError, LithosResult};

/// Named-payload storage for checkpoints.
pub trait CheckpointStore: Send {
    /// Writes (or replaces) a payload.
    fn write(&mut self, name: &str, payload: &[u8]) -> LithosResult<()>;

    /// Reads a payload. A missing payload is an I/O `NotFound` error.
    fn read(&self, name: &str) -> LithosResult<Vec<u8>>;

    fn exists(&self, name: &str) -> bool;

    /// Names of all stored payloads.
    fn list(&self) -> LithosResult<Vec<String>>;

    /// Whether the store's backing location exists at all.
    fn is_available(&self) -> bool;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}

/// In-memory store. Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Drops every payload whose name satisfies `pred`.
    pub fn remove_where(&self, pred: impl Fn(&str) -> bool) {
        self.entries().retain(|name, _| !pred(name));
    }
}

impl CheckpointStore for MemoryStore {
    fn write(&mut self, name: &str, payload: &[u8]) -> LithosResult<()> {
        self.entries().insert(name.to_string(), payload.to_vec());
        Ok(())
    }

    fn read(&self, name: &str) -> LithosResult<Vec<u8>> {
        self.entries().get(name).cloned().ok_or_else(|| {
            LithosError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, format!("{name} not in memory store")))
        })
    }

    fn exists(&self, name: &str) -> bool {
        self.entries().contains_key(name)
    }

    fn list(&self) -> LithosResult<Vec<String>> {
        Ok(self.entries().keys().cloned().collect())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn location(&self) -> String {
        "<memory>".into()
    }
}

/// Store backed by a directory; payloads are plain files.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl CheckpointStore for DirectoryStore {
    fn write(&mut self, name: &str, payload: &[u8]) -> LithosResult<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.path(name);
        fs::write(&path, payload)?;
        tracing::debug!(path = %path.display(), bytes = payload.len(), "payload written");
        Ok(())
    }

    fn read(&self, name: &str) -> LithosResult<Vec<u8>> {
        let path = self.path(name);
        match fs::read(&path) {
            Ok(bytes) => {
                tracing::debug!(path = %path.display(), bytes = bytes.len(), "payload read");
                Ok(bytes)
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "payload unreadable");
                Err(e.into())
            }
        }
    }

    fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    fn list(&self) -> LithosResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        tracing::debug!(root = %self.root.display(), entries = names.len(), "checkpoint directory listed");
        Ok(names)
    }

    fn is_available(&self) -> bool {
        self.root.is_dir()
    }

    fn location(&self) -> String {
        self.root.display().to_string()
    }
}
