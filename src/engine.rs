//! Post-quantum engine: algorithm resolution and size discipline around the
//! primitive backend.
//!
//! The engine owns no key material. It resolves names through the registry,
//! rejects arguments that contradict the resolved descriptor, delegates to
//! the [`PqPrimitive`] collaborator, and cross-checks backend output sizes
//! against the registry before handing results back.

use std::sync::Arc;

use crate::error::CryptoError;
use crate::provider::{KeyPair, PqPrimitive};
use crate::registry::{AlgorithmInfo, AlgorithmRegistry};

pub struct PostQuantumEngine {
    registry: Arc<AlgorithmRegistry>,
    backend: Arc<dyn PqPrimitive>,
}

impl PostQuantumEngine {
    pub fn new(registry: Arc<AlgorithmRegistry>, backend: Arc<dyn PqPrimitive>) -> Self {
        Self { registry, backend }
    }

    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    /// Resolve an explicit suite name, or fall back to the registry default.
    pub fn resolve(&self, algorithm: Option<&str>) -> Result<AlgorithmInfo, CryptoError> {
        match algorithm {
            Some(name) => self.registry.get(name),
            None => {
                let name = self.registry.get_default()?;
                self.registry.get(&name)
            }
        }
    }

    /// Generate a key pair for the given (or default) suite. The backend's
    /// public-key length is verified against the registry.
    pub fn generate_key_pair(&self, algorithm: Option<&str>) -> Result<KeyPair, CryptoError> {
        let info = self.resolve(algorithm)?;
        let pair = self.backend.generate_key_pair(&info)?;
        if pair.public_key.len() != info.key_size {
            return Err(CryptoError::SizeMismatch {
                algorithm: info.name,
                expected: info.key_size,
                actual: pair.public_key.len(),
            });
        }
        Ok(pair)
    }

    /// Public-key encryption of `data` (KEM suites only).
    pub fn encrypt(
        &self,
        algorithm: Option<&str>,
        public_key: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        if data.is_empty() {
            return Err(CryptoError::InvalidInput("data"));
        }
        if public_key.is_empty() {
            return Err(CryptoError::InvalidInput("public key"));
        }
        let info = self.resolve(algorithm)?;
        if !info.is_kem() {
            return Err(CryptoError::InvalidInput("not an encryption algorithm"));
        }
        if public_key.len() != info.key_size {
            return Err(CryptoError::SizeMismatch {
                algorithm: info.name,
                expected: info.key_size,
                actual: public_key.len(),
            });
        }
        self.backend.encrypt(&info, public_key, data)
    }

    /// Inverse of [`PostQuantumEngine::encrypt`]. Once arguments are
    /// non-empty and the suite resolves, every failure collapses to
    /// [`CryptoError::DecryptionFailed`].
    pub fn decrypt(
        &self,
        algorithm: Option<&str>,
        secret_key: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        if secret_key.is_empty() {
            return Err(CryptoError::InvalidInput("secret key"));
        }
        if data.is_empty() {
            return Err(CryptoError::InvalidInput("ciphertext"));
        }
        let info = self.resolve(algorithm)?;
        if !info.is_kem() {
            return Err(CryptoError::InvalidInput("not an encryption algorithm"));
        }
        self.backend
            .decrypt(&info, secret_key, data)
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    /// Detached signature over `data` (signature suites only). The backend's
    /// signature length is verified against the registry.
    pub fn sign(
        &self,
        algorithm: Option<&str>,
        secret_key: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        if data.is_empty() {
            return Err(CryptoError::InvalidInput("data"));
        }
        if secret_key.is_empty() {
            return Err(CryptoError::InvalidInput("secret key"));
        }
        let info = self.resolve(algorithm)?;
        if info.is_kem() {
            return Err(CryptoError::InvalidInput("not a signature algorithm"));
        }
        let signature = self.backend.sign(&info, secret_key, data)?;
        if signature.len() != info.signature_size {
            return Err(CryptoError::SizeMismatch {
                algorithm: info.name,
                expected: info.signature_size,
                actual: signature.len(),
            });
        }
        Ok(signature)
    }

    /// Verify a detached signature. A signature of the wrong length returns
    /// `Ok(false)` rather than an error, so callers see one uniform outcome
    /// for every bad signature.
    pub fn verify(
        &self,
        algorithm: Option<&str>,
        public_key: &[u8],
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        if data.is_empty() {
            return Err(CryptoError::InvalidInput("data"));
        }
        if public_key.is_empty() {
            return Err(CryptoError::InvalidInput("public key"));
        }
        let info = self.resolve(algorithm)?;
        if info.is_kem() {
            return Err(CryptoError::InvalidInput("not a signature algorithm"));
        }
        if public_key.len() != info.key_size {
            return Err(CryptoError::SizeMismatch {
                algorithm: info.name,
                expected: info.key_size,
                actual: public_key.len(),
            });
        }
        if signature.len() != info.signature_size {
            return Ok(false);
        }
        self.backend.verify(&info, public_key, data, signature)
    }

    /// Whether `material` has a plausible encoding for the named suite.
    /// Unknown names and empty material are simply `false`.
    pub fn validate_material(&self, algorithm: &str, material: &[u8]) -> bool {
        if material.is_empty() {
            return false;
        }
        match self.registry.get(algorithm) {
            Ok(info) => self.backend.validate_material(&info, material),
            Err(_) => false,
        }
    }
}
