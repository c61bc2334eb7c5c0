//! Hybrid cipher: the framed KEM-DEM envelope plus the symmetric session
//! fast path.
//!
//! `encrypt` wraps a fresh 256-bit data key under the recipient's public key
//! and seals the payload with AES-256-GCM, producing one self-describing
//! frame (see [`crate::wire`]). `encrypt_with_session_key` skips the
//! public-key work entirely and seals under an internal rotating session
//! key, amortizing cost across many payloads to the same trust domain.

use std::sync::{Arc, RwLock};

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use crate::engine::PostQuantumEngine;
use crate::error::CryptoError;
use crate::provider::{KeyPair, RandomSource, SymmetricCipher};
use crate::wire;

/// AAD label binding session-sealed blobs to the fast path.
const SESSION_CONTEXT: &[u8] = b"palisade-session-v1";

// ---------------------------------------------------------------------------
// Session keys
// ---------------------------------------------------------------------------

/// A snapshot of the rotating session key. Copies are independent: a caller
/// that captured the key before a rotation can finish its in-flight work,
/// while new calls observe the replacement.
#[derive(Clone)]
pub struct SessionKey {
    bytes: Zeroizing<[u8; 32]>,
    generation: u64,
}

impl SessionKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Monotonic rotation counter, starting at 1.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// ---------------------------------------------------------------------------
// Hybrid cipher
// ---------------------------------------------------------------------------

pub struct HybridCipher {
    engine: Arc<PostQuantumEngine>,
    cipher: Arc<dyn SymmetricCipher>,
    random: Arc<dyn RandomSource>,
    session: RwLock<SessionKey>,
}

impl HybridCipher {
    /// Build a cipher over the given collaborators and generate the initial
    /// session key.
    pub fn new(
        engine: Arc<PostQuantumEngine>,
        cipher: Arc<dyn SymmetricCipher>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, CryptoError> {
        let mut bytes = Zeroizing::new([0u8; 32]);
        random.fill(&mut *bytes)?;
        Ok(Self {
            engine,
            cipher,
            random,
            session: RwLock::new(SessionKey {
                bytes,
                generation: 1,
            }),
        })
    }

    /// Key pair for the default suite.
    pub fn generate_key_pair(&self) -> Result<KeyPair, CryptoError> {
        self.engine.generate_key_pair(None)
    }

    /// Encrypt `data` to `public_key` under the default suite.
    ///
    /// A fresh data key is wrapped per call; no session state is involved.
    pub fn encrypt(&self, public_key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if data.is_empty() {
            return Err(CryptoError::InvalidInput("data"));
        }
        if public_key.is_empty() {
            return Err(CryptoError::InvalidInput("public key"));
        }
        let info = self.engine.resolve(None)?;

        let mut dek = Zeroizing::new([0u8; 32]);
        self.random.fill(&mut *dek)?;

        let key_block = self.engine.encrypt(Some(&info.name), public_key, &*dek)?;
        let payload = self.cipher.seal(&dek, data, info.name.as_bytes())?;
        wire::encode_wire(&info.name, &key_block, &payload)
    }

    /// Decrypt a frame produced by [`HybridCipher::encrypt`].
    ///
    /// The suite is recovered from the frame itself. Past the empty-argument
    /// checks, every failure (parse, unwrap, tag) is reported as
    /// [`CryptoError::DecryptionFailed`].
    pub fn decrypt(&self, secret_key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if secret_key.is_empty() {
            return Err(CryptoError::InvalidInput("secret key"));
        }
        if ciphertext.is_empty() {
            return Err(CryptoError::InvalidInput("ciphertext"));
        }
        let parts = wire::decode_wire(ciphertext)?;

        let mut dek_bytes = self
            .engine
            .decrypt(Some(parts.algorithm), secret_key, parts.key_block)
            .map_err(|_| CryptoError::DecryptionFailed)?;
        if dek_bytes.len() != 32 {
            dek_bytes.zeroize();
            return Err(CryptoError::DecryptionFailed);
        }
        let mut dek = Zeroizing::new([0u8; 32]);
        dek.copy_from_slice(&dek_bytes);
        dek_bytes.zeroize();

        self.cipher
            .open(&dek, parts.payload, parts.algorithm.as_bytes())
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    /// Decrypt under `old_secret` and immediately re-encrypt to `new_public`,
    /// never exposing the plaintext to the caller.
    pub fn reencrypt(
        &self,
        ciphertext: &[u8],
        old_secret: &[u8],
        new_public: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let plaintext = Zeroizing::new(self.decrypt(old_secret, ciphertext)?);
        self.encrypt(new_public, &plaintext)
    }

    /// Probe whether `public_key` and `secret_key` form a working pair for
    /// any registered KEM suite.
    pub fn validate_key_pair(&self, public_key: &[u8], secret_key: &[u8]) -> bool {
        if public_key.is_empty() || secret_key.is_empty() {
            return false;
        }
        let registry = self.engine.registry();
        for name in registry.list_available() {
            let info = match registry.get(&name) {
                Ok(info) => info,
                Err(_) => continue,
            };
            if !info.is_kem() || info.key_size != public_key.len() {
                continue;
            }
            // Round-trip a throwaway secret through the pair.
            let mut probe = Zeroizing::new([0u8; 32]);
            if self.random.fill(&mut *probe).is_err() {
                return false;
            }
            let ct = match self.engine.encrypt(Some(&name), public_key, &*probe) {
                Ok(ct) => ct,
                Err(_) => continue,
            };
            match self.engine.decrypt(Some(&name), secret_key, &ct) {
                Ok(recovered) if bool::from(recovered.ct_eq(probe.as_slice())) => return true,
                _ => continue,
            }
        }
        false
    }

    // -----------------------------------------------------------------------
    // Session fast path
    // -----------------------------------------------------------------------

    /// Snapshot of the current session key.
    pub fn session_key(&self) -> SessionKey {
        self.session.read().unwrap().clone()
    }

    /// Replace the session key with fresh random bytes and bump the
    /// generation counter.
    pub fn rotate_session_key(&self) -> Result<(), CryptoError> {
        let mut bytes = Zeroizing::new([0u8; 32]);
        self.random.fill(&mut *bytes)?;
        let mut session = self.session.write().unwrap();
        let generation = session.generation + 1;
        *session = SessionKey { bytes, generation };
        Ok(())
    }

    /// Seal `data` under the current session key. No public-key work.
    pub fn encrypt_with_session_key(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if data.is_empty() {
            return Err(CryptoError::InvalidInput("data"));
        }
        let key = self.session_key();
        self.cipher.seal(key.as_bytes(), data, SESSION_CONTEXT)
    }

    /// Open a blob sealed by [`HybridCipher::encrypt_with_session_key`] under
    /// the current session key. Blobs sealed before a rotation no longer
    /// open.
    pub fn decrypt_with_session_key(&self, blob: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if blob.is_empty() {
            return Err(CryptoError::InvalidInput("ciphertext"));
        }
        let key = self.session_key();
        self.cipher
            .open(key.as_bytes(), blob, SESSION_CONTEXT)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}
