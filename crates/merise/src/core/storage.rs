//! Persistence collaborators
//!
//! The state manager hands every serialized snapshot to a [`Storage`] slot
//! and reads the same slot back on startup. Failures are reported to the
//! caller, which logs them and keeps working in memory.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Key-value slot storage
pub trait Storage: Send {
    /// Read a slot; `Ok(None)` when it has never been written
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite a slot
    fn save(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-memory storage for tests and headless use
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.slots.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.slots.get(key).map(String::as_str)
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per slot inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slot_path(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.slot_path(key);
        fs::write(&path, value).with_context(|| format!("writing {}", path.display()))
    }
}

/// Storage that keeps nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStorage;

impl Storage for NullStorage {
    fn load(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn save(&mut self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_round_trip() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.load("slot").unwrap(), None);
        storage.save("slot", "{}").unwrap();
        assert_eq!(storage.load("slot").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_slot_path_is_sanitised() {
        let storage = FileStorage::new("/tmp/diagrams");
        assert_eq!(
            storage.slot_path("er-diagram-v2"),
            PathBuf::from("/tmp/diagrams/er-diagram-v2.json")
        );
        assert_eq!(
            storage.slot_path("../etc/passwd"),
            PathBuf::from("/tmp/diagrams/___etc_passwd.json")
        );
    }

    #[test]
    fn test_null_storage() {
        let mut storage = NullStorage;
        storage.save("k", "v").unwrap();
        assert!(storage.load("k").unwrap().is_none());
    }
}
