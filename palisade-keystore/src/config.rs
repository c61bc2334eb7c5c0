//! Facade configuration.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::PalisadeError;

/// Where key records persist.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum StorageChoice {
    /// Ephemeral, process-local.
    #[default]
    Memory,
    /// One JSON file per record under this directory.
    Directory(PathBuf),
}

/// Settings consumed by [`crate::Palisade::initialize`].
///
/// Loadable from JSON; absent fields take their defaults:
///
/// ```json
/// {
///   "storage": { "Directory": "/var/lib/palisade/keys" },
///   "default_algorithm": "ml-kem-1024",
///   "session_rotate_secs": 3600
/// }
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct PalisadeConfig {
    /// Backend for the key material store.
    pub storage: StorageChoice,
    /// Override for the registry's default algorithm.
    pub default_algorithm: Option<String>,
    /// Upper bound on session-key age, in seconds. Checked on facade use;
    /// a stale session key is rotated before the operation proceeds.
    pub session_rotate_secs: Option<u64>,
}

impl PalisadeConfig {
    pub fn from_json(json: &str) -> Result<Self, PalisadeError> {
        serde_json::from_str(json)
            .map_err(|e| PalisadeError::InitializationFailed(format!("config: {}", e)))
    }
}
