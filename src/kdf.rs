//! Key derivation: HKDF-SHA256 over the KEM shared secret.
//!
//! The info string binds the protocol id, the hash of the KEM ciphertext and
//! the suite name, so a data key is only ever valid for the exact
//! encapsulation and algorithm it was derived for.

use hkdf::Hkdf;
use sha2::Sha256;
use sha3::{Digest, Sha3_256};

use crate::error::CryptoError;
use crate::wire::PROTOCOL_ID;

pub(crate) const DERIVED_KEY_BYTES: usize = 32;

/// SHA3-256 of the KEM ciphertext, mixed into the KDF info string.
pub(crate) fn ct_hash(kem_ct: &[u8]) -> [u8; 32] {
    let digest = Sha3_256::digest(kem_ct);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Derive the 256-bit data-encryption key for one encapsulation.
pub(crate) fn derive_key(
    shared_secret: &[u8],
    ct_hash: &[u8; 32],
    context: &[u8],
) -> Result<[u8; DERIVED_KEY_BYTES], CryptoError> {
    let hk = Hkdf::<Sha256>::new(None, shared_secret);

    let mut info = Vec::with_capacity(PROTOCOL_ID.len() + 5 + ct_hash.len() + context.len());
    info.extend_from_slice(PROTOCOL_ID);
    info.extend_from_slice(b"|dek|");
    info.extend_from_slice(ct_hash);
    info.extend_from_slice(context);

    let mut key = [0u8; DERIVED_KEY_BYTES];
    hk.expand(&info, &mut key)
        .map_err(|_| CryptoError::OperationFailed {
            op: "derive key",
            detail: "hkdf expand rejected output length".to_string(),
        })?;
    Ok(key)
}
