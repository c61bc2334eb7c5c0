//! Algorithm registry: the authoritative catalog of supported suites.
//!
//! Every orchestration layer resolves algorithm names through this registry
//! before touching a primitive backend. Entries are validated once at
//! registration; lookups return owned descriptors so callers never hold the
//! registry lock across a crypto operation.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::backend::{
    DILITHIUM2_PUBLIC_KEY_BYTES, DILITHIUM2_SIGNATURE_BYTES, DILITHIUM3_PUBLIC_KEY_BYTES,
    DILITHIUM3_SIGNATURE_BYTES, DILITHIUM5_PUBLIC_KEY_BYTES, DILITHIUM5_SIGNATURE_BYTES,
};
use crate::error::CryptoError;
use crate::kem::{
    HYBRID_PUBLIC_KEY_BYTES, MLKEM1024_PUBLIC_KEY_BYTES, MLKEM512_PUBLIC_KEY_BYTES,
    MLKEM768_PUBLIC_KEY_BYTES,
};

// ---------------------------------------------------------------------------
// Built-in suite names
// ---------------------------------------------------------------------------

pub const ML_KEM_512: &str = "ml-kem-512";
pub const ML_KEM_768: &str = "ml-kem-768";
pub const ML_KEM_1024: &str = "ml-kem-1024";
pub const X25519_ML_KEM_768: &str = "x25519-ml-kem-768";
pub const DILITHIUM2: &str = "dilithium2";
pub const DILITHIUM3: &str = "dilithium3";
pub const DILITHIUM5: &str = "dilithium5";

// ---------------------------------------------------------------------------
// Algorithm descriptor
// ---------------------------------------------------------------------------

/// Immutable descriptor for one algorithm suite.
///
/// `key_size` is the public-key length in bytes. `signature_size` is zero for
/// KEM suites; a non-zero value marks the suite as signature-only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlgorithmInfo {
    pub name: String,
    /// NIST security category (1, 2, 3 or 5).
    pub security_level: u8,
    pub key_size: usize,
    pub signature_size: usize,
    pub recommended: bool,
    pub description: String,
}

impl AlgorithmInfo {
    /// Descriptor for a key-encapsulation suite.
    pub fn kem(
        name: &str,
        security_level: u8,
        key_size: usize,
        recommended: bool,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            security_level,
            key_size,
            signature_size: 0,
            recommended,
            description: description.to_string(),
        }
    }

    /// Descriptor for a signature suite.
    pub fn signature(
        name: &str,
        security_level: u8,
        key_size: usize,
        signature_size: usize,
        recommended: bool,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            security_level,
            key_size,
            signature_size,
            recommended,
            description: description.to_string(),
        }
    }

    /// True when this suite can encapsulate (encrypt); false for
    /// signature-only suites.
    pub fn is_kem(&self) -> bool {
        self.signature_size == 0
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

struct RegistryInner {
    algorithms: HashMap<String, AlgorithmInfo>,
    default: Option<String>,
}

/// Thread-safe algorithm catalog with an optional explicit default.
///
/// When no explicit default is set, [`AlgorithmRegistry::get_default`] falls
/// back to the strongest recommended entry (ties broken by name) and fails
/// with [`CryptoError::NoDefaultSet`] only when nothing is recommended.
pub struct AlgorithmRegistry {
    inner: RwLock<RegistryInner>,
}

impl AlgorithmRegistry {
    /// An empty registry with no entries and no default.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                algorithms: HashMap::new(),
                default: None,
            }),
        }
    }

    /// The built-in suite set, with `x25519-ml-kem-768` as the default.
    pub fn builtin() -> Self {
        let mut algorithms = HashMap::new();
        for info in builtin_set() {
            algorithms.insert(info.name.clone(), info);
        }
        Self {
            inner: RwLock::new(RegistryInner {
                algorithms,
                default: Some(X25519_ML_KEM_768.to_string()),
            }),
        }
    }

    /// Register a new suite. Names are unique; registering an existing name
    /// fails with [`CryptoError::DuplicateAlgorithm`].
    pub fn register(&self, info: AlgorithmInfo) -> Result<(), CryptoError> {
        let mut inner = self.inner.write().unwrap();
        if inner.algorithms.contains_key(&info.name) {
            return Err(CryptoError::DuplicateAlgorithm(info.name));
        }
        inner.algorithms.insert(info.name.clone(), info);
        Ok(())
    }

    /// Look up a suite by name.
    pub fn get(&self, name: &str) -> Result<AlgorithmInfo, CryptoError> {
        let inner = self.inner.read().unwrap();
        inner
            .algorithms
            .get(name)
            .cloned()
            .ok_or_else(|| CryptoError::UnknownAlgorithm(name.to_string()))
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.inner.read().unwrap().algorithms.contains_key(name)
    }

    /// All registered suite names, sorted.
    pub fn list_available(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        let mut names: Vec<String> = inner.algorithms.keys().cloned().collect();
        names.sort();
        names
    }

    /// Recommended suite names only, sorted.
    pub fn list_recommended(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        let mut names: Vec<String> = inner
            .algorithms
            .values()
            .filter(|info| info.recommended)
            .map(|info| info.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Set the explicit default. The name must already be registered.
    pub fn set_default(&self, name: &str) -> Result<(), CryptoError> {
        let mut inner = self.inner.write().unwrap();
        if !inner.algorithms.contains_key(name) {
            return Err(CryptoError::UnknownAlgorithm(name.to_string()));
        }
        inner.default = Some(name.to_string());
        Ok(())
    }

    /// The default suite name.
    ///
    /// Returns the explicit default when one was set, otherwise the
    /// recommended entry with the highest security level (smallest name on a
    /// tie). Fails with [`CryptoError::NoDefaultSet`] when the registry has
    /// no recommended entries.
    pub fn get_default(&self) -> Result<String, CryptoError> {
        let inner = self.inner.read().unwrap();
        if let Some(name) = &inner.default {
            return Ok(name.clone());
        }
        inner
            .algorithms
            .values()
            .filter(|info| info.recommended)
            .max_by(|a, b| {
                a.security_level
                    .cmp(&b.security_level)
                    .then_with(|| b.name.cmp(&a.name))
            })
            .map(|info| info.name.clone())
            .ok_or(CryptoError::NoDefaultSet)
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_set() -> Vec<AlgorithmInfo> {
    vec![
        AlgorithmInfo::kem(
            ML_KEM_512,
            1,
            MLKEM512_PUBLIC_KEY_BYTES,
            false,
            "ML-KEM-512 (FIPS 203), NIST security category 1",
        ),
        AlgorithmInfo::kem(
            ML_KEM_768,
            3,
            MLKEM768_PUBLIC_KEY_BYTES,
            true,
            "ML-KEM-768 (FIPS 203), NIST security category 3",
        ),
        AlgorithmInfo::kem(
            ML_KEM_1024,
            5,
            MLKEM1024_PUBLIC_KEY_BYTES,
            true,
            "ML-KEM-1024 (FIPS 203), NIST security category 5",
        ),
        AlgorithmInfo::kem(
            X25519_ML_KEM_768,
            3,
            HYBRID_PUBLIC_KEY_BYTES,
            true,
            "Hybrid X25519 + ML-KEM-768; secure while either primitive holds",
        ),
        AlgorithmInfo::signature(
            DILITHIUM2,
            2,
            DILITHIUM2_PUBLIC_KEY_BYTES,
            DILITHIUM2_SIGNATURE_BYTES,
            false,
            "CRYSTALS-Dilithium2 detached signatures, NIST security category 2",
        ),
        AlgorithmInfo::signature(
            DILITHIUM3,
            3,
            DILITHIUM3_PUBLIC_KEY_BYTES,
            DILITHIUM3_SIGNATURE_BYTES,
            true,
            "CRYSTALS-Dilithium3 detached signatures, NIST security category 3",
        ),
        AlgorithmInfo::signature(
            DILITHIUM5,
            5,
            DILITHIUM5_PUBLIC_KEY_BYTES,
            DILITHIUM5_SIGNATURE_BYTES,
            true,
            "CRYSTALS-Dilithium5 detached signatures, NIST security category 5",
        ),
    ]
}
