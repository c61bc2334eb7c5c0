//! Key material store: wrapped-at-rest storage with lifecycle helpers.
//!
//! Material never reaches a backend in the clear. Each record carries
//! `epoch(u32 BE) || AEAD blob`, sealed under the 32-byte master key of that
//! epoch with the record id as associated data. The master ring holds the
//! current epoch plus every older epoch created in this process, so
//! `rotate_master_key` never breaks reads; `reencrypt_key` migrates records
//! forward one at a time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use rand_core::RngCore;
use zeroize::Zeroizing;

use palisade_hybrid::{AesGcmCipher, PostQuantumEngine, SymmetricCipher};

use crate::error::KeystoreError;
use crate::storage::StorageBackend;
use crate::types::{KeyId, KeyMetadata, KeyRecord, KeyStats};

// ---------------------------------------------------------------------------
// Master key ring
// ---------------------------------------------------------------------------

fn fresh_master() -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    rand_core::OsRng.fill_bytes(&mut *key);
    key
}

/// Per-epoch wrapping keys. Epochs only grow; old keys stay readable until
/// the process ends.
struct MasterKeyRing {
    current_epoch: u32,
    current_key: Zeroizing<[u8; 32]>,
    older: HashMap<u32, Zeroizing<[u8; 32]>>,
}

impl MasterKeyRing {
    fn bootstrap() -> Self {
        Self {
            current_epoch: 1,
            current_key: fresh_master(),
            older: HashMap::new(),
        }
    }

    fn rotate(&mut self) -> u32 {
        let retired = std::mem::replace(&mut self.current_key, fresh_master());
        self.older.insert(self.current_epoch, retired);
        self.current_epoch += 1;
        self.current_epoch
    }

    fn key_for(&self, epoch: u32) -> Option<&Zeroizing<[u8; 32]>> {
        if epoch == self.current_epoch {
            Some(&self.current_key)
        } else {
            self.older.get(&epoch)
        }
    }
}

// ---------------------------------------------------------------------------
// Key material store
// ---------------------------------------------------------------------------

/// Stores opaque key material wrapped at rest.
///
/// Reads run concurrently against the backend; every mutation goes through
/// one writer mutex plus the backend's atomic `put`, so a reader observes
/// either the old record or the new one, never a half-written state.
pub struct KeyMaterialStore {
    storage: Arc<dyn StorageBackend>,
    engine: Arc<PostQuantumEngine>,
    wrap: AesGcmCipher,
    masters: RwLock<MasterKeyRing>,
    writer: Mutex<()>,
}

impl KeyMaterialStore {
    /// Create a store over the given backend. A fresh master key (epoch 1)
    /// is drawn; wrapping keys live only in this process.
    pub fn new(storage: Arc<dyn StorageBackend>, engine: Arc<PostQuantumEngine>) -> Self {
        Self {
            storage,
            engine,
            wrap: AesGcmCipher,
            masters: RwLock::new(MasterKeyRing::bootstrap()),
            writer: Mutex::new(()),
        }
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    /// Store new material, returning its generated id.
    pub async fn store_key(
        &self,
        material: &[u8],
        metadata: KeyMetadata,
    ) -> Result<KeyId, KeystoreError> {
        if material.is_empty() {
            return Err(KeystoreError::InvalidMaterial("empty"));
        }
        let id = KeyId::generate();
        let record = KeyRecord {
            wrapped_hex: self.wrap_material(&id, material)?,
            id: id.clone(),
            metadata,
            access_count: 0,
            last_access: None,
        };

        let _guard = self.writer.lock().unwrap();
        self.storage.put(&record)?;
        tracing::info!(key_id = %id, algorithm = %record.metadata.algorithm, "stored key");
        Ok(id)
    }

    /// Unwrapped copy of the material. Bumps the access counters
    /// best-effort; a failed stats write never fails the read.
    pub async fn get_key(&self, id: &KeyId) -> Result<Zeroizing<Vec<u8>>, KeystoreError> {
        let record = self.get_record(id)?;
        let material = self.unwrap_material(&record)?;
        self.touch(id);
        Ok(material)
    }

    /// Remove a key. Deleting an absent id is not an error.
    pub async fn delete_key(&self, id: &KeyId) -> Result<(), KeystoreError> {
        let _guard = self.writer.lock().unwrap();
        self.storage.delete(id)?;
        tracing::info!(key_id = %id, "deleted key");
        Ok(())
    }

    /// Replace the material, leaving metadata untouched.
    pub async fn update_key(&self, id: &KeyId, material: &[u8]) -> Result<(), KeystoreError> {
        if material.is_empty() {
            return Err(KeystoreError::InvalidMaterial("empty"));
        }
        let _guard = self.writer.lock().unwrap();
        let mut record = self.get_record(id)?;
        record.wrapped_hex = self.wrap_material(id, material)?;
        self.storage.put(&record)
    }

    /// Replace the material and reset `created_at` to now.
    pub async fn rotate_key(&self, id: &KeyId, material: &[u8]) -> Result<(), KeystoreError> {
        if material.is_empty() {
            return Err(KeystoreError::InvalidMaterial("empty"));
        }
        let _guard = self.writer.lock().unwrap();
        let mut record = self.get_record(id)?;
        record.wrapped_hex = self.wrap_material(id, material)?;
        record.metadata.created_at = Utc::now();
        self.storage.put(&record)?;
        tracing::info!(key_id = %id, "rotated key");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Metadata
    // -----------------------------------------------------------------------

    pub async fn get_key_metadata(&self, id: &KeyId) -> Result<KeyMetadata, KeystoreError> {
        Ok(self.get_record(id)?.metadata)
    }

    /// Full metadata replace.
    pub async fn update_key_metadata(
        &self,
        id: &KeyId,
        metadata: KeyMetadata,
    ) -> Result<(), KeystoreError> {
        let _guard = self.writer.lock().unwrap();
        let mut record = self.get_record(id)?;
        record.metadata = metadata;
        self.storage.put(&record)
    }

    pub async fn set_key_expiration(
        &self,
        id: &KeyId,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), KeystoreError> {
        let _guard = self.writer.lock().unwrap();
        let mut record = self.get_record(id)?;
        record.metadata.expires_at = expires_at;
        self.storage.put(&record)
    }

    /// Whether the key is past its expiration. Keys without one never
    /// expire.
    pub async fn is_key_expired(&self, id: &KeyId) -> Result<bool, KeystoreError> {
        Ok(self.get_record(id)?.metadata.is_expired())
    }

    /// Delete every expired key, returning how many were removed.
    pub async fn cleanup_expired_keys(&self) -> Result<usize, KeystoreError> {
        let _guard = self.writer.lock().unwrap();
        let mut removed = 0;
        for record in self.storage.list()? {
            if record.metadata.is_expired() {
                self.storage.delete(&record.id)?;
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(removed, "cleaned up expired keys");
        }
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Access levels and stats
    // -----------------------------------------------------------------------

    pub async fn has_access(&self, id: &KeyId, level: &str) -> Result<bool, KeystoreError> {
        Ok(self.get_record(id)?.metadata.access_levels.contains(level))
    }

    /// Grant a level. Granting one already present is a no-op.
    pub async fn add_access_level(&self, id: &KeyId, level: &str) -> Result<(), KeystoreError> {
        let _guard = self.writer.lock().unwrap();
        let mut record = self.get_record(id)?;
        record.metadata.access_levels.insert(level.to_string());
        self.storage.put(&record)
    }

    /// Revoke a level. Revoking an absent one is a no-op.
    pub async fn remove_access_level(&self, id: &KeyId, level: &str) -> Result<(), KeystoreError> {
        let _guard = self.writer.lock().unwrap();
        let mut record = self.get_record(id)?;
        record.metadata.access_levels.remove(level);
        self.storage.put(&record)
    }

    pub async fn key_stats(&self, id: &KeyId) -> Result<KeyStats, KeystoreError> {
        let record = self.get_record(id)?;
        Ok(KeyStats {
            created_at: record.metadata.created_at,
            access_count: record.access_count,
            last_access: record.last_access,
        })
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Whether the stored material has a plausible encoding for its declared
    /// algorithm. Malformed-but-present keys are `false`, never an error;
    /// only a missing id fails.
    pub async fn validate_key(&self, id: &KeyId) -> Result<bool, KeystoreError> {
        let record = self.get_record(id)?;
        let material = match self.unwrap_material(&record) {
            Ok(material) => material,
            Err(_) => return Ok(false),
        };
        Ok(self
            .engine
            .validate_material(&record.metadata.algorithm, &material))
    }

    /// True iff every stored key validates.
    pub async fn validate_all_keys(&self) -> Result<bool, KeystoreError> {
        for record in self.storage.list()? {
            let valid = match self.unwrap_material(&record) {
                Ok(material) => self
                    .engine
                    .validate_material(&record.metadata.algorithm, &material),
                Err(_) => false,
            };
            if !valid {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Inventory
    // -----------------------------------------------------------------------

    pub async fn key_count(&self) -> Result<usize, KeystoreError> {
        self.storage.len()
    }

    pub async fn all_key_ids(&self) -> Result<Vec<KeyId>, KeystoreError> {
        let mut ids = self.storage.ids()?;
        ids.sort();
        Ok(ids)
    }

    // -----------------------------------------------------------------------
    // Master key rotation
    // -----------------------------------------------------------------------

    /// Current master epoch.
    pub fn master_epoch(&self) -> u32 {
        self.masters.read().unwrap().current_epoch
    }

    /// Push a fresh master key, returning the new epoch. Existing records
    /// stay readable under their old epochs until reencrypted.
    pub fn rotate_master_key(&self) -> u32 {
        let epoch = self.masters.write().unwrap().rotate();
        tracing::info!(epoch, "rotated master key");
        epoch
    }

    /// Re-wrap one record under the current epoch. Returns `false` when the
    /// record is already current. The logical material bytes never change.
    pub async fn reencrypt_key(&self, id: &KeyId) -> Result<bool, KeystoreError> {
        let _guard = self.writer.lock().unwrap();
        let mut record = self.get_record(id)?;
        let epoch = wrapped_epoch(&record.wrapped_hex)?;
        if epoch == self.master_epoch() {
            return Ok(false);
        }
        let material = self.unwrap_material(&record)?;
        record.wrapped_hex = self.wrap_material(id, &material)?;
        self.storage.put(&record)?;
        Ok(true)
    }

    /// Migrate every record to the current epoch, returning how many were
    /// re-wrapped.
    pub async fn reencrypt_all_keys(&self) -> Result<usize, KeystoreError> {
        let mut migrated = 0;
        for id in self.storage.ids()? {
            match self.reencrypt_key(&id).await {
                Ok(true) => migrated += 1,
                Ok(false) => {}
                // Deleted while we iterated; nothing to migrate.
                Err(KeystoreError::KeyNotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }
        tracing::info!(migrated, "reencrypted keys");
        Ok(migrated)
    }

    // -----------------------------------------------------------------------
    // Wrapping helpers
    // -----------------------------------------------------------------------

    fn get_record(&self, id: &KeyId) -> Result<KeyRecord, KeystoreError> {
        self.storage
            .get(id)?
            .ok_or_else(|| KeystoreError::KeyNotFound(id.clone()))
    }

    fn wrap_material(&self, id: &KeyId, material: &[u8]) -> Result<String, KeystoreError> {
        let ring = self.masters.read().unwrap();
        let blob = self
            .wrap
            .seal(&ring.current_key, material, id.as_str().as_bytes())
            .map_err(|e| KeystoreError::AtRest(format!("wrap: {}", e)))?;
        let mut out = Vec::with_capacity(4 + blob.len());
        out.extend_from_slice(&ring.current_epoch.to_be_bytes());
        out.extend_from_slice(&blob);
        Ok(hex::encode(out))
    }

    fn unwrap_material(&self, record: &KeyRecord) -> Result<Zeroizing<Vec<u8>>, KeystoreError> {
        let wrapped = hex::decode(&record.wrapped_hex)
            .map_err(|_| KeystoreError::AtRest("bad hex".to_string()))?;
        if wrapped.len() < 4 {
            return Err(KeystoreError::AtRest("truncated".to_string()));
        }
        let epoch = u32::from_be_bytes([wrapped[0], wrapped[1], wrapped[2], wrapped[3]]);
        let ring = self.masters.read().unwrap();
        let key = ring
            .key_for(epoch)
            .ok_or_else(|| KeystoreError::AtRest(format!("unknown master epoch {}", epoch)))?;
        let material = self
            .wrap
            .open(key, &wrapped[4..], record.id.as_str().as_bytes())
            .map_err(|_| KeystoreError::AtRest("unwrap failed".to_string()))?;
        Ok(Zeroizing::new(material))
    }

    /// Best-effort access-stat bump after a successful read. Re-reads under
    /// the writer lock so a concurrent metadata update is not clobbered.
    fn touch(&self, id: &KeyId) {
        let _guard = self.writer.lock().unwrap();
        let mut record = match self.storage.get(id) {
            Ok(Some(record)) => record,
            _ => return,
        };
        record.access_count += 1;
        record.last_access = Some(Utc::now());
        if let Err(err) = self.storage.put(&record) {
            tracing::debug!(key_id = %id, error = %err, "access stats not persisted");
        }
    }
}

fn wrapped_epoch(wrapped_hex: &str) -> Result<u32, KeystoreError> {
    let wrapped =
        hex::decode(wrapped_hex).map_err(|_| KeystoreError::AtRest("bad hex".to_string()))?;
    if wrapped.len() < 4 {
        return Err(KeystoreError::AtRest("truncated".to_string()));
    }
    Ok(u32::from_be_bytes([
        wrapped[0], wrapped[1], wrapped[2], wrapped[3],
    ]))
}
