//! Hybrid envelope wire format.
//!
//! ```text
//! +---------+-------+------------------+----------------+--------------------+-----------------+
//! | version | flags | alg_len (u16 BE) | algorithm name | kb_len (u32 BE)    | key block       |
//! | 1 byte  | 1 byte| 2 bytes          | alg_len bytes  | 4 bytes            | kb_len bytes    |
//! +---------+-------+------------------+----------------+--------------------+-----------------+
//! | payload: nonce (12) || aead ciphertext+tag                                                 |
//! +--------------------------------------------------------------------------------------------+
//! ```
//!
//! The key block carries the public-key encryption of the fresh data key;
//! the payload is the AES-256-GCM blob sealed under that key. The frame is
//! self-describing: decrypt recovers the suite from the embedded name alone.
//!
//! Parsing is strict. Any unknown version or flags, truncated field, or
//! inconsistent length fails with [`CryptoError::DecryptionFailed`] so the
//! decode path stays indistinguishable from an authentication failure.

use core::str;

use crate::aead;
use crate::error::CryptoError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Domain-separation label mixed into every key derivation.
pub const PROTOCOL_ID: &[u8] = b"palisade-hybrid-v1";

pub const PROTOCOL_VERSION: u8 = 0x01;

/// Reserved; must be zero in version 1 frames.
pub const FLAGS_V1: u8 = 0x00;

/// version + flags + algorithm-name length.
pub const HEADER_BYTES: usize = 1 + 1 + 2;

pub const KEY_BLOCK_LEN_BYTES: usize = 4;

pub const MAX_ALGORITHM_NAME_BYTES: usize = 64;

/// Smallest frame that can possibly parse: one-byte algorithm name, one-byte
/// key block, empty plaintext payload.
pub const MIN_CIPHERTEXT_BYTES: usize =
    HEADER_BYTES + 1 + KEY_BLOCK_LEN_BYTES + 1 + aead::NONCE_BYTES + aead::TAG_BYTES;

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

/// Borrowed view of one decoded frame.
#[derive(Clone, Copy, Debug)]
pub struct WireComponents<'a> {
    pub version: u8,
    pub flags: u8,
    pub algorithm: &'a str,
    pub key_block: &'a [u8],
    pub payload: &'a [u8],
}

/// Assemble a version-1 frame.
pub fn encode_wire(
    algorithm: &str,
    key_block: &[u8],
    payload: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if algorithm.is_empty() || algorithm.len() > MAX_ALGORITHM_NAME_BYTES {
        return Err(CryptoError::InvalidInput("algorithm name length"));
    }
    if key_block.is_empty() || key_block.len() > u32::MAX as usize {
        return Err(CryptoError::InvalidInput("key block length"));
    }
    if payload.len() < aead::NONCE_BYTES + aead::TAG_BYTES {
        return Err(CryptoError::InvalidInput("payload too short"));
    }

    let mut out = Vec::with_capacity(
        HEADER_BYTES + algorithm.len() + KEY_BLOCK_LEN_BYTES + key_block.len() + payload.len(),
    );
    out.push(PROTOCOL_VERSION);
    out.push(FLAGS_V1);
    out.extend_from_slice(&(algorithm.len() as u16).to_be_bytes());
    out.extend_from_slice(algorithm.as_bytes());
    out.extend_from_slice(&(key_block.len() as u32).to_be_bytes());
    out.extend_from_slice(key_block);
    out.extend_from_slice(payload);
    Ok(out)
}

/// Parse a frame without copying. Every deviation from the format above
/// fails with [`CryptoError::DecryptionFailed`].
pub fn decode_wire(data: &[u8]) -> Result<WireComponents<'_>, CryptoError> {
    if data.len() < MIN_CIPHERTEXT_BYTES {
        return Err(CryptoError::DecryptionFailed);
    }

    let version = data[0];
    let flags = data[1];
    if version != PROTOCOL_VERSION || flags != FLAGS_V1 {
        return Err(CryptoError::DecryptionFailed);
    }

    let alg_len = u16::from_be_bytes([data[2], data[3]]) as usize;
    if alg_len == 0 || alg_len > MAX_ALGORITHM_NAME_BYTES {
        return Err(CryptoError::DecryptionFailed);
    }
    let kb_len_start = HEADER_BYTES + alg_len;
    if data.len() < kb_len_start + KEY_BLOCK_LEN_BYTES {
        return Err(CryptoError::DecryptionFailed);
    }
    let algorithm = str::from_utf8(&data[HEADER_BYTES..kb_len_start])
        .map_err(|_| CryptoError::DecryptionFailed)?;

    let kb_len_bytes: [u8; KEY_BLOCK_LEN_BYTES] = data
        [kb_len_start..kb_len_start + KEY_BLOCK_LEN_BYTES]
        .try_into()
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let key_block_len = u32::from_be_bytes(kb_len_bytes) as usize;
    if key_block_len == 0 {
        return Err(CryptoError::DecryptionFailed);
    }

    let key_start = kb_len_start + KEY_BLOCK_LEN_BYTES;
    let key_end = key_start + key_block_len;
    if key_end > data.len() {
        return Err(CryptoError::DecryptionFailed);
    }
    if data.len() - key_end < aead::NONCE_BYTES + aead::TAG_BYTES {
        return Err(CryptoError::DecryptionFailed);
    }

    Ok(WireComponents {
        version,
        flags,
        algorithm,
        key_block: &data[key_start..key_end],
        payload: &data[key_end..],
    })
}
