// Key-value store backends.
// File-backed JSON map with atomic writes, and a shared in-memory map.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tempfile::NamedTempFile;

use crate::error::{GatewayError, Result};

type Entries = BTreeMap<String, String>;

/// Serializes read-modify-write cycles of every `FileStore` in the process.
static WRITE_LOCK: Mutex<()> = Mutex::new(());

/// Read access to persisted string entries.
pub trait KeyValueStore: Send + Sync {
    /// Current value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }
}

/// Store persisted as a JSON object in a single file.
///
/// The file is re-read on every lookup so that writes from elsewhere
/// (another handle, another process) are picked up immediately.
/// Writers within one process are serialized; writers in other processes
/// are not, and the last rename wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform default location.
    pub fn open_default() -> Result<Self> {
        super::paths::storage_path()
            .map(Self::new)
            .ok_or_else(|| GatewayError::Other("no data directory for this platform".into()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set `key` to `value`, creating the file if needed.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = WRITE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    /// Remove `key`. Missing keys are not an error.
    pub fn remove(&self, key: &str) -> Result<()> {
        let _guard = WRITE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }

    fn read_entries(&self) -> Result<Entries> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_entries(&self, entries: &Entries) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let json = serde_json::to_string_pretty(entries)?;

        // Uniquely named sibling, renamed over the store once synced
        let mut file = NamedTempFile::new_in(parent)?;
        file.write_all(json.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;

        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }
}

/// In-process store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<Entries>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: &str) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
    }

    pub fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned())
    }
}
