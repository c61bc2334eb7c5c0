//! Storage backends: where wrapped key records live.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::KeystoreError;
use crate::types::{KeyId, KeyRecord};

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// Backend for persisting key records.
///
/// Implement this for your infrastructure:
/// - InMemoryBackend (testing, ephemeral)
/// - FileBackend (development)
/// - Your database (production)
pub trait StorageBackend: Send + Sync {
    fn get(&self, id: &KeyId) -> Result<Option<KeyRecord>, KeystoreError>;
    fn put(&self, record: &KeyRecord) -> Result<(), KeystoreError>;
    fn delete(&self, id: &KeyId) -> Result<(), KeystoreError>;
    fn list(&self) -> Result<Vec<KeyRecord>, KeystoreError>;
    fn ids(&self) -> Result<Vec<KeyId>, KeystoreError>;
    fn len(&self) -> Result<usize, KeystoreError>;
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// In-memory storage (for testing and ephemeral use).
pub struct InMemoryBackend {
    records: RwLock<HashMap<String, KeyRecord>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for InMemoryBackend {
    fn get(&self, id: &KeyId) -> Result<Option<KeyRecord>, KeystoreError> {
        let records = self.records.read().unwrap();
        Ok(records.get(id.as_str()).cloned())
    }

    fn put(&self, record: &KeyRecord) -> Result<(), KeystoreError> {
        let mut records = self.records.write().unwrap();
        records.insert(record.id.as_str().to_string(), record.clone());
        Ok(())
    }

    fn delete(&self, id: &KeyId) -> Result<(), KeystoreError> {
        let mut records = self.records.write().unwrap();
        records.remove(id.as_str());
        Ok(())
    }

    fn list(&self) -> Result<Vec<KeyRecord>, KeystoreError> {
        let records = self.records.read().unwrap();
        Ok(records.values().cloned().collect())
    }

    fn ids(&self) -> Result<Vec<KeyId>, KeystoreError> {
        let records = self.records.read().unwrap();
        Ok(records.values().map(|r| r.id.clone()).collect())
    }

    fn len(&self) -> Result<usize, KeystoreError> {
        let records = self.records.read().unwrap();
        Ok(records.len())
    }
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// File-based storage (one JSON file per record).
///
/// Directory layout:
/// ```text
/// keys/
///   {key_id}.json
/// ```
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, KeystoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| KeystoreError::Storage(format!("create dir: {}", e)))?;
        Ok(Self { dir })
    }

    fn record_path(&self, id: &KeyId) -> PathBuf {
        self.dir.join(format!("{}.json", id.as_str()))
    }

    fn read_record_file(&self, path: &Path) -> Result<KeyRecord, KeystoreError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| KeystoreError::Storage(format!("read: {}", e)))?;
        serde_json::from_str(&data).map_err(|e| KeystoreError::Storage(format!("parse: {}", e)))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, id: &KeyId) -> Result<Option<KeyRecord>, KeystoreError> {
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(None);
        }
        self.read_record_file(&path).map(Some)
    }

    fn put(&self, record: &KeyRecord) -> Result<(), KeystoreError> {
        let path = self.record_path(&record.id);
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| KeystoreError::Storage(format!("serialize: {}", e)))?;
        // Atomic write: write to temp, then rename
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &json)
            .map_err(|e| KeystoreError::Storage(format!("write: {}", e)))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| KeystoreError::Storage(format!("rename: {}", e)))?;
        Ok(())
    }

    fn delete(&self, id: &KeyId) -> Result<(), KeystoreError> {
        let path = self.record_path(id);
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| KeystoreError::Storage(format!("delete: {}", e)))?;
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<KeyRecord>, KeystoreError> {
        let mut records = Vec::new();
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| KeystoreError::Storage(format!("readdir: {}", e)))?;
        for entry in entries {
            let entry = entry.map_err(|e| KeystoreError::Storage(format!("entry: {}", e)))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                records.push(self.read_record_file(&path)?);
            }
        }
        Ok(records)
    }

    fn ids(&self) -> Result<Vec<KeyId>, KeystoreError> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| KeystoreError::Storage(format!("readdir: {}", e)))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| KeystoreError::Storage(format!("entry: {}", e)))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(KeyId::new(stem));
            }
        }
        Ok(ids)
    }

    fn len(&self) -> Result<usize, KeystoreError> {
        Ok(self.ids()?.len())
    }
}
