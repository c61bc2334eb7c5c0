//! Default software primitive backend.
//!
//! KEM suites encrypt with a KEM-DEM pipeline: encapsulate to the recipient,
//! derive a one-shot AES-256-GCM key from the shared secret, seal the data.
//! The output layout is fixed per suite:
//!
//! ```text
//! kem_ct || nonce (12) || aead ciphertext+tag
//! ```
//!
//! Signature suites produce CRYSTALS-Dilithium detached signatures.
//!
//! Suite names are resolved once into a dispatch table at construction;
//! per-call work is a single map lookup and an enum match.

use std::collections::HashMap;

use pqcrypto_dilithium::{dilithium2, dilithium3, dilithium5};
use pqcrypto_traits::sign::{DetachedSignature, PublicKey, SecretKey};
use zeroize::Zeroizing;

use crate::aead;
use crate::error::CryptoError;
use crate::kdf;
use crate::kem::KemAlgorithm;
use crate::provider::{KeyPair, PqPrimitive};
use crate::registry::{
    AlgorithmInfo, DILITHIUM2, DILITHIUM3, DILITHIUM5, ML_KEM_1024, ML_KEM_512, ML_KEM_768,
    X25519_ML_KEM_768,
};

// ---------------------------------------------------------------------------
// Dilithium sizes (bytes)
// ---------------------------------------------------------------------------

pub(crate) const DILITHIUM2_PUBLIC_KEY_BYTES: usize = 1312;
pub(crate) const DILITHIUM2_SECRET_KEY_BYTES: usize = 2528;
pub(crate) const DILITHIUM2_SIGNATURE_BYTES: usize = 2420;

pub(crate) const DILITHIUM3_PUBLIC_KEY_BYTES: usize = 1952;
pub(crate) const DILITHIUM3_SECRET_KEY_BYTES: usize = 4000;
pub(crate) const DILITHIUM3_SIGNATURE_BYTES: usize = 3293;

pub(crate) const DILITHIUM5_PUBLIC_KEY_BYTES: usize = 2592;
pub(crate) const DILITHIUM5_SECRET_KEY_BYTES: usize = 4864;
pub(crate) const DILITHIUM5_SIGNATURE_BYTES: usize = 4595;

// ---------------------------------------------------------------------------
// Suite dispatch
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
enum Suite {
    Kem(KemAlgorithm),
    Sig(SigAlgorithm),
}

#[derive(Clone, Copy, Debug)]
enum SigAlgorithm {
    Dilithium2,
    Dilithium3,
    Dilithium5,
}

impl SigAlgorithm {
    fn public_key_size(self) -> usize {
        match self {
            Self::Dilithium2 => DILITHIUM2_PUBLIC_KEY_BYTES,
            Self::Dilithium3 => DILITHIUM3_PUBLIC_KEY_BYTES,
            Self::Dilithium5 => DILITHIUM5_PUBLIC_KEY_BYTES,
        }
    }

    fn secret_key_size(self) -> usize {
        match self {
            Self::Dilithium2 => DILITHIUM2_SECRET_KEY_BYTES,
            Self::Dilithium3 => DILITHIUM3_SECRET_KEY_BYTES,
            Self::Dilithium5 => DILITHIUM5_SECRET_KEY_BYTES,
        }
    }

    fn keygen(self) -> (Vec<u8>, Zeroizing<Vec<u8>>) {
        match self {
            Self::Dilithium2 => {
                let (pk, sk) = dilithium2::keypair();
                (pk.as_bytes().to_vec(), Zeroizing::new(sk.as_bytes().to_vec()))
            }
            Self::Dilithium3 => {
                let (pk, sk) = dilithium3::keypair();
                (pk.as_bytes().to_vec(), Zeroizing::new(sk.as_bytes().to_vec()))
            }
            Self::Dilithium5 => {
                let (pk, sk) = dilithium5::keypair();
                (pk.as_bytes().to_vec(), Zeroizing::new(sk.as_bytes().to_vec()))
            }
        }
    }

    fn sign(self, secret_key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            Self::Dilithium2 => {
                let sk = dilithium2::SecretKey::from_bytes(secret_key)
                    .map_err(|_| CryptoError::InvalidInput("secret key"))?;
                Ok(dilithium2::detached_sign(data, &sk).as_bytes().to_vec())
            }
            Self::Dilithium3 => {
                let sk = dilithium3::SecretKey::from_bytes(secret_key)
                    .map_err(|_| CryptoError::InvalidInput("secret key"))?;
                Ok(dilithium3::detached_sign(data, &sk).as_bytes().to_vec())
            }
            Self::Dilithium5 => {
                let sk = dilithium5::SecretKey::from_bytes(secret_key)
                    .map_err(|_| CryptoError::InvalidInput("secret key"))?;
                Ok(dilithium5::detached_sign(data, &sk).as_bytes().to_vec())
            }
        }
    }

    fn verify(self, public_key: &[u8], data: &[u8], signature: &[u8]) -> Result<bool, CryptoError> {
        match self {
            Self::Dilithium2 => {
                let pk = dilithium2::PublicKey::from_bytes(public_key)
                    .map_err(|_| CryptoError::InvalidInput("public key"))?;
                let sig = match dilithium2::DetachedSignature::from_bytes(signature) {
                    Ok(sig) => sig,
                    Err(_) => return Ok(false),
                };
                Ok(dilithium2::verify_detached_signature(&sig, data, &pk).is_ok())
            }
            Self::Dilithium3 => {
                let pk = dilithium3::PublicKey::from_bytes(public_key)
                    .map_err(|_| CryptoError::InvalidInput("public key"))?;
                let sig = match dilithium3::DetachedSignature::from_bytes(signature) {
                    Ok(sig) => sig,
                    Err(_) => return Ok(false),
                };
                Ok(dilithium3::verify_detached_signature(&sig, data, &pk).is_ok())
            }
            Self::Dilithium5 => {
                let pk = dilithium5::PublicKey::from_bytes(public_key)
                    .map_err(|_| CryptoError::InvalidInput("public key"))?;
                let sig = match dilithium5::DetachedSignature::from_bytes(signature) {
                    Ok(sig) => sig,
                    Err(_) => return Ok(false),
                };
                Ok(dilithium5::verify_detached_signature(&sig, data, &pk).is_ok())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Pure-software implementation of every built-in suite.
pub struct SoftwareBackend {
    suites: HashMap<String, Suite>,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        let mut suites = HashMap::new();
        suites.insert(ML_KEM_512.to_string(), Suite::Kem(KemAlgorithm::MlKem512));
        suites.insert(ML_KEM_768.to_string(), Suite::Kem(KemAlgorithm::MlKem768));
        suites.insert(ML_KEM_1024.to_string(), Suite::Kem(KemAlgorithm::MlKem1024));
        suites.insert(
            X25519_ML_KEM_768.to_string(),
            Suite::Kem(KemAlgorithm::HybridX25519MlKem768),
        );
        suites.insert(DILITHIUM2.to_string(), Suite::Sig(SigAlgorithm::Dilithium2));
        suites.insert(DILITHIUM3.to_string(), Suite::Sig(SigAlgorithm::Dilithium3));
        suites.insert(DILITHIUM5.to_string(), Suite::Sig(SigAlgorithm::Dilithium5));
        Self { suites }
    }

    fn suite(&self, name: &str) -> Result<Suite, CryptoError> {
        self.suites
            .get(name)
            .copied()
            .ok_or_else(|| CryptoError::UnknownAlgorithm(name.to_string()))
    }

    fn kem_suite(&self, name: &str) -> Result<KemAlgorithm, CryptoError> {
        match self.suite(name)? {
            Suite::Kem(kem) => Ok(kem),
            Suite::Sig(_) => Err(CryptoError::InvalidInput("not an encryption algorithm")),
        }
    }

    fn sig_suite(&self, name: &str) -> Result<SigAlgorithm, CryptoError> {
        match self.suite(name)? {
            Suite::Sig(sig) => Ok(sig),
            Suite::Kem(_) => Err(CryptoError::InvalidInput("not a signature algorithm")),
        }
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl PqPrimitive for SoftwareBackend {
    fn generate_key_pair(&self, info: &AlgorithmInfo) -> Result<KeyPair, CryptoError> {
        let (public_key, secret_key) = match self.suite(&info.name)? {
            Suite::Kem(kem) => kem.generate(),
            Suite::Sig(sig) => sig.keygen(),
        };
        Ok(KeyPair {
            algorithm: info.name.clone(),
            public_key,
            secret_key,
        })
    }

    fn encrypt(
        &self,
        info: &AlgorithmInfo,
        public_key: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let kem = self.kem_suite(&info.name)?;
        let (shared, kem_ct) = kem.encapsulate(public_key)?;
        let ct_hash = kdf::ct_hash(&kem_ct);
        let dek = Zeroizing::new(kdf::derive_key(&shared, &ct_hash, info.name.as_bytes())?);
        let nonce = aead::nonce()?;
        let aead_ct = aead::aead_seal(&dek, &nonce, data, &[])?;

        let mut out = Vec::with_capacity(kem_ct.len() + aead::NONCE_BYTES + aead_ct.len());
        out.extend_from_slice(&kem_ct);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&aead_ct);
        Ok(out)
    }

    fn decrypt(
        &self,
        info: &AlgorithmInfo,
        secret_key: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        let kem = self.kem_suite(&info.name)?;
        let ct_size = kem.ciphertext_size();
        if data.len() < ct_size + aead::NONCE_BYTES + aead::TAG_BYTES {
            return Err(CryptoError::DecryptionFailed);
        }
        let (kem_ct, rest) = data.split_at(ct_size);
        let (nonce_bytes, aead_ct) = rest.split_at(aead::NONCE_BYTES);
        let nonce: [u8; aead::NONCE_BYTES] = nonce_bytes
            .try_into()
            .map_err(|_| CryptoError::DecryptionFailed)?;

        let shared = kem.decapsulate(secret_key, kem_ct)?;
        let ct_hash = kdf::ct_hash(kem_ct);
        let dek = Zeroizing::new(
            kdf::derive_key(&shared, &ct_hash, info.name.as_bytes())
                .map_err(|_| CryptoError::DecryptionFailed)?,
        );
        aead::aead_open(&dek, &nonce, aead_ct, &[])
    }

    fn sign(
        &self,
        info: &AlgorithmInfo,
        secret_key: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        self.sig_suite(&info.name)?.sign(secret_key, data)
    }

    fn verify(
        &self,
        info: &AlgorithmInfo,
        public_key: &[u8],
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, CryptoError> {
        self.sig_suite(&info.name)?.verify(public_key, data, signature)
    }

    fn validate_material(&self, info: &AlgorithmInfo, material: &[u8]) -> bool {
        match self.suites.get(info.name.as_str()) {
            Some(Suite::Kem(kem)) => {
                material.len() == kem.public_key_size() || material.len() == kem.secret_key_size()
            }
            Some(Suite::Sig(sig)) => {
                material.len() == sig.public_key_size() || material.len() == sig.secret_key_size()
            }
            None => false,
        }
    }
}
