//! Capability seams for the pluggable primitive collaborators.
//!
//! The post-quantum primitive, the classical AEAD, and the random source sit
//! behind object-safe traits so deployments can swap in hardware-backed or
//! alternative software implementations without touching the orchestration
//! layers. The crate ships software defaults: [`crate::SoftwareBackend`],
//! [`crate::AesGcmCipher`] and [`OsRandom`].

use core::fmt;

use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::registry::AlgorithmInfo;

// ---------------------------------------------------------------------------
// Key pairs
// ---------------------------------------------------------------------------

/// A freshly generated key pair. Secret bytes are wiped on drop.
#[derive(Clone)]
pub struct KeyPair {
    pub algorithm: String,
    pub public_key: Vec<u8>,
    pub secret_key: Zeroizing<Vec<u8>>,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.algorithm)
            .field("public_key", &format_args!("[{} bytes]", self.public_key.len()))
            .field("secret_key", &format_args!("[redacted]"))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Post-quantum primitive operations for the suites a backend supports.
///
/// Implementations receive the resolved [`AlgorithmInfo`] rather than a raw
/// name, so the registry remains the single source of suite metadata.
pub trait PqPrimitive: Send + Sync {
    fn generate_key_pair(&self, info: &AlgorithmInfo) -> Result<KeyPair, CryptoError>;

    /// Public-key encryption of `data` (KEM suites only).
    fn encrypt(
        &self,
        info: &AlgorithmInfo,
        public_key: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// Inverse of [`PqPrimitive::encrypt`]. Failures collapse to
    /// [`CryptoError::DecryptionFailed`].
    fn decrypt(
        &self,
        info: &AlgorithmInfo,
        secret_key: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// Detached signature over `data` (signature suites only).
    fn sign(
        &self,
        info: &AlgorithmInfo,
        secret_key: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;

    /// Verify a detached signature. A well-formed request with a bad
    /// signature returns `Ok(false)`, never an error.
    fn verify(
        &self,
        info: &AlgorithmInfo,
        public_key: &[u8],
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError>;

    /// Whether `material` has a plausible encoding for the suite. The default
    /// accepts public-key-sized material only; backends that know their
    /// secret-key encodings should override.
    fn validate_material(&self, info: &AlgorithmInfo, material: &[u8]) -> bool {
        material.len() == info.key_size
    }
}

/// Authenticated symmetric cipher used for payload and at-rest encryption.
///
/// `seal` returns a self-contained blob (nonce followed by ciphertext and
/// tag); `open` is its inverse and fails with
/// [`CryptoError::DecryptionFailed`] on any mismatch.
pub trait SymmetricCipher: Send + Sync {
    fn seal(&self, key: &[u8; 32], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError>;
    fn open(&self, key: &[u8; 32], blob: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// Cryptographically secure randomness for session keys and fresh secrets.
pub trait RandomSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CryptoError>;
}

/// Operating-system entropy via `getrandom`.
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        getrandom::getrandom(buf).map_err(|_| CryptoError::RandomFailure)
    }
}
