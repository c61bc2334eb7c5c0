//! AES-256-GCM payload encryption.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::error::CryptoError;
use crate::provider::SymmetricCipher;

pub const KEY_BYTES: usize = 32;
pub const NONCE_BYTES: usize = 12;
pub const TAG_BYTES: usize = 16;

/// Fresh random nonce from OS entropy.
pub(crate) fn nonce() -> Result<[u8; NONCE_BYTES], CryptoError> {
    let mut n = [0u8; NONCE_BYTES];
    getrandom::getrandom(&mut n).map_err(|_| CryptoError::RandomFailure)?;
    Ok(n)
}

/// Encrypt and authenticate `plaintext`, binding `aad`. Returns ciphertext
/// with the 16-byte tag appended.
pub(crate) fn aead_seal(
    key: &[u8; KEY_BYTES],
    nonce: &[u8; NONCE_BYTES],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::OperationFailed {
        op: "aead seal",
        detail: "invalid key length".to_string(),
    })?;
    let n = Nonce::from_slice(nonce);
    cipher
        .encrypt(
            n,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::OperationFailed {
            op: "aead seal",
            detail: "encryption rejected input".to_string(),
        })
}

/// Decrypt and verify. Any failure collapses to
/// [`CryptoError::DecryptionFailed`].
pub(crate) fn aead_open(
    key: &[u8; KEY_BYTES],
    nonce: &[u8; NONCE_BYTES],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() < TAG_BYTES {
        return Err(CryptoError::DecryptionFailed);
    }
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::DecryptionFailed)?;
    let n = Nonce::from_slice(nonce);
    cipher
        .decrypt(
            n,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::DecryptionFailed)
}

/// Software AES-256-GCM cipher producing self-framed blobs
/// (`nonce || ciphertext || tag`).
pub struct AesGcmCipher;

impl SymmetricCipher for AesGcmCipher {
    fn seal(&self, key: &[u8; 32], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let n = nonce()?;
        let ct = aead_seal(key, &n, plaintext, aad)?;
        let mut blob = Vec::with_capacity(NONCE_BYTES + ct.len());
        blob.extend_from_slice(&n);
        blob.extend_from_slice(&ct);
        Ok(blob)
    }

    fn open(&self, key: &[u8; 32], blob: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if blob.len() < NONCE_BYTES + TAG_BYTES {
            return Err(CryptoError::DecryptionFailed);
        }
        let n: [u8; NONCE_BYTES] = blob[..NONCE_BYTES]
            .try_into()
            .map_err(|_| CryptoError::DecryptionFailed)?;
        aead_open(key, &n, &blob[NONCE_BYTES..], aad)
    }
}
