//! Core types: KeyId, KeyMetadata, KeyRecord, KeyStats.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rand_core::RngCore;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Key identifiers
// ---------------------------------------------------------------------------

/// Unique key identifier (hex-encoded random bytes).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyId(String);

impl KeyId {
    /// Create a new random KeyId.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand_core::OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Create from a specific string (for testing/deterministic use).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Key metadata
// ---------------------------------------------------------------------------

/// Caller-visible description of a stored key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMetadata {
    /// Algorithm the material belongs to (registry name).
    pub algorithm: String,
    /// When the material was stored (reset by rotation).
    pub created_at: DateTime<Utc>,
    /// When the key stops being usable. None = never expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// Access levels allowed to use this key.
    pub access_levels: BTreeSet<String>,
    /// Arbitrary labels.
    pub tags: BTreeSet<String>,
}

impl KeyMetadata {
    /// Metadata for a key stored now, never expiring, with no access levels
    /// or tags.
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            created_at: Utc::now(),
            expires_at: None,
            access_levels: BTreeSet::new(),
            tags: BTreeSet::new(),
        }
    }

    /// Whether the key is past its expiration, if one is set.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|t| Utc::now() > t).unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Stored record
// ---------------------------------------------------------------------------

/// What a storage backend persists: the wrapped material plus metadata and
/// access counters. The material is never stored in the clear; `wrapped_hex`
/// is `epoch(u32 BE) || AEAD blob` under the master key of that epoch,
/// hex-encoded for JSON safety.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyRecord {
    pub id: KeyId,
    pub wrapped_hex: String,
    pub metadata: KeyMetadata,
    pub access_count: u64,
    pub last_access: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Access statistics
// ---------------------------------------------------------------------------

/// Usage snapshot for one key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStats {
    pub created_at: DateTime<Utc>,
    pub access_count: u64,
    pub last_access: Option<DateTime<Utc>>,
}
