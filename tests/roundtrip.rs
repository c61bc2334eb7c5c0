//! End-to-end tests for the hybrid envelope: round-trips, frame layout,
//! tamper detection and the session fast path.

use std::sync::Arc;

use palisade_hybrid::wire::{HEADER_BYTES, KEY_BLOCK_LEN_BYTES, PROTOCOL_VERSION};
use palisade_hybrid::{
    AesGcmCipher, AlgorithmRegistry, CryptoError, HybridCipher, OsRandom, PostQuantumEngine,
    SoftwareBackend, X25519_ML_KEM_768,
};

const DEFAULT_ALG: &str = X25519_ML_KEM_768;

// Default-suite layout: kem_ct (1120) || nonce (12) || sealed 32-byte data
// key (32 + 16).
const KEY_BLOCK_BYTES: usize = 1120 + 12 + 32 + 16;

fn setup() -> (HybridCipher, Vec<u8>, Vec<u8>) {
    let registry = Arc::new(AlgorithmRegistry::builtin());
    let engine = Arc::new(PostQuantumEngine::new(
        registry,
        Arc::new(SoftwareBackend::new()),
    ));
    let cipher = HybridCipher::new(engine, Arc::new(AesGcmCipher), Arc::new(OsRandom)).unwrap();
    let pair = cipher.generate_key_pair().unwrap();
    let secret = pair.secret_key.to_vec();
    (cipher, pair.public_key, secret)
}

fn key_block_start() -> usize {
    HEADER_BYTES + DEFAULT_ALG.len() + KEY_BLOCK_LEN_BYTES
}

// ---------------------------------------------------------------------------
// Round-trips
// ---------------------------------------------------------------------------

#[test]
fn roundtrip_basic() {
    let (cipher, pk, sk) = setup();
    let msg = b"the quick brown fox";
    let ct = cipher.encrypt(&pk, msg).unwrap();
    assert_eq!(cipher.decrypt(&sk, &ct).unwrap(), msg);
}

#[test]
fn roundtrip_one_byte() {
    let (cipher, pk, sk) = setup();
    let ct = cipher.encrypt(&pk, &[0x2a]).unwrap();
    assert_eq!(cipher.decrypt(&sk, &ct).unwrap(), vec![0x2a]);
}

#[test]
fn roundtrip_large_payload() {
    let (cipher, pk, sk) = setup();
    let msg = vec![0xa5u8; 65536];
    let ct = cipher.encrypt(&pk, &msg).unwrap();
    assert_eq!(cipher.decrypt(&sk, &ct).unwrap(), msg);
}

#[test]
fn ciphertexts_are_nondeterministic() {
    let (cipher, pk, _) = setup();
    let a = cipher.encrypt(&pk, b"same message").unwrap();
    let b = cipher.encrypt(&pk, b"same message").unwrap();
    assert_ne!(a, b);
}

#[test]
fn default_suite_key_sizes() {
    let (_, pk, sk) = setup();
    assert_eq!(pk.len(), 1216);
    assert_eq!(sk.len(), 2432);
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

#[test]
fn empty_plaintext_rejected() {
    let (cipher, pk, _) = setup();
    assert_eq!(
        cipher.encrypt(&pk, b""),
        Err(CryptoError::InvalidInput("data"))
    );
}

#[test]
fn empty_public_key_rejected() {
    let (cipher, _, _) = setup();
    assert_eq!(
        cipher.encrypt(&[], b"message"),
        Err(CryptoError::InvalidInput("public key"))
    );
}

#[test]
fn empty_ciphertext_rejected() {
    let (cipher, _, sk) = setup();
    assert_eq!(
        cipher.decrypt(&sk, &[]),
        Err(CryptoError::InvalidInput("ciphertext"))
    );
}

#[test]
fn empty_secret_key_rejected() {
    let (cipher, pk, _) = setup();
    let ct = cipher.encrypt(&pk, b"message").unwrap();
    assert_eq!(
        cipher.decrypt(&[], &ct),
        Err(CryptoError::InvalidInput("secret key"))
    );
}

#[test]
fn wrong_size_public_key_rejected() {
    let (cipher, pk, _) = setup();
    assert!(matches!(
        cipher.encrypt(&pk[..pk.len() - 1], b"message"),
        Err(CryptoError::SizeMismatch { .. })
    ));
}

// ---------------------------------------------------------------------------
// Frame layout
// ---------------------------------------------------------------------------

#[test]
fn frame_header_fields() {
    let (cipher, pk, _) = setup();
    let ct = cipher.encrypt(&pk, b"hello").unwrap();

    assert_eq!(ct[0], PROTOCOL_VERSION);
    assert_eq!(ct[1], 0x00);
    let alg_len = u16::from_be_bytes([ct[2], ct[3]]) as usize;
    assert_eq!(alg_len, DEFAULT_ALG.len());
    assert_eq!(&ct[HEADER_BYTES..HEADER_BYTES + alg_len], DEFAULT_ALG.as_bytes());

    let kb_off = HEADER_BYTES + alg_len;
    let kb_len = u32::from_be_bytes([ct[kb_off], ct[kb_off + 1], ct[kb_off + 2], ct[kb_off + 3]])
        as usize;
    assert_eq!(kb_len, KEY_BLOCK_BYTES);
}

#[test]
fn frame_length_is_exact() {
    let (cipher, pk, _) = setup();
    let msg = b"hello";
    let ct = cipher.encrypt(&pk, msg).unwrap();
    // header + name + key-block length + key block + nonce + payload + tag
    let expected =
        HEADER_BYTES + DEFAULT_ALG.len() + KEY_BLOCK_LEN_BYTES + KEY_BLOCK_BYTES + 12 + msg.len() + 16;
    assert_eq!(ct.len(), expected);
}

// ---------------------------------------------------------------------------
// Tamper detection
// ---------------------------------------------------------------------------

#[test]
fn wrong_recipient_key_fails() {
    let (cipher, pk, _) = setup();
    let (_, _, other_sk) = setup();
    let ct = cipher.encrypt(&pk, b"message").unwrap();
    assert_eq!(
        cipher.decrypt(&other_sk, &ct),
        Err(CryptoError::DecryptionFailed)
    );
}

#[test]
fn tampered_version_fails() {
    let (cipher, pk, sk) = setup();
    let mut ct = cipher.encrypt(&pk, b"message").unwrap();
    ct[0] ^= 0x01;
    assert_eq!(cipher.decrypt(&sk, &ct), Err(CryptoError::DecryptionFailed));
}

#[test]
fn tampered_flags_fail() {
    let (cipher, pk, sk) = setup();
    let mut ct = cipher.encrypt(&pk, b"message").unwrap();
    ct[1] ^= 0x01;
    assert_eq!(cipher.decrypt(&sk, &ct), Err(CryptoError::DecryptionFailed));
}

#[test]
fn tampered_algorithm_name_fails() {
    let (cipher, pk, sk) = setup();
    let mut ct = cipher.encrypt(&pk, b"message").unwrap();
    ct[HEADER_BYTES + 2] ^= 0x01;
    assert_eq!(cipher.decrypt(&sk, &ct), Err(CryptoError::DecryptionFailed));
}

#[test]
fn tampered_key_block_length_fails() {
    let (cipher, pk, sk) = setup();
    let mut ct = cipher.encrypt(&pk, b"message").unwrap();
    ct[HEADER_BYTES + DEFAULT_ALG.len() + 3] ^= 0x01;
    assert_eq!(cipher.decrypt(&sk, &ct), Err(CryptoError::DecryptionFailed));
}

#[test]
fn tampered_kem_ciphertext_fails() {
    let (cipher, pk, sk) = setup();
    let mut ct = cipher.encrypt(&pk, b"message").unwrap();
    ct[key_block_start() + 100] ^= 0x01;
    assert_eq!(cipher.decrypt(&sk, &ct), Err(CryptoError::DecryptionFailed));
}

#[test]
fn tampered_wrapped_key_fails() {
    let (cipher, pk, sk) = setup();
    let mut ct = cipher.encrypt(&pk, b"message").unwrap();
    // Last byte of the key block is inside the sealed data key.
    let off = key_block_start() + KEY_BLOCK_BYTES - 1;
    ct[off] ^= 0x01;
    assert_eq!(cipher.decrypt(&sk, &ct), Err(CryptoError::DecryptionFailed));
}

#[test]
fn tampered_payload_nonce_fails() {
    let (cipher, pk, sk) = setup();
    let mut ct = cipher.encrypt(&pk, b"message").unwrap();
    let off = key_block_start() + KEY_BLOCK_BYTES;
    ct[off] ^= 0x01;
    assert_eq!(cipher.decrypt(&sk, &ct), Err(CryptoError::DecryptionFailed));
}

#[test]
fn tampered_payload_body_fails() {
    let (cipher, pk, sk) = setup();
    let mut ct = cipher.encrypt(&pk, b"message").unwrap();
    let off = key_block_start() + KEY_BLOCK_BYTES + 12;
    ct[off] ^= 0x01;
    assert_eq!(cipher.decrypt(&sk, &ct), Err(CryptoError::DecryptionFailed));
}

#[test]
fn tampered_tag_fails() {
    let (cipher, pk, sk) = setup();
    let mut ct = cipher.encrypt(&pk, b"message").unwrap();
    let last = ct.len() - 1;
    ct[last] ^= 0x01;
    assert_eq!(cipher.decrypt(&sk, &ct), Err(CryptoError::DecryptionFailed));
}

#[test]
fn truncated_frame_fails() {
    let (cipher, pk, sk) = setup();
    let ct = cipher.encrypt(&pk, b"message").unwrap();
    assert_eq!(
        cipher.decrypt(&sk, &ct[..ct.len() - 1]),
        Err(CryptoError::DecryptionFailed)
    );
    assert_eq!(
        cipher.decrypt(&sk, &ct[..3]),
        Err(CryptoError::DecryptionFailed)
    );
}

#[test]
fn garbage_input_fails() {
    let (cipher, _, sk) = setup();
    let garbage = vec![0x5cu8; 4096];
    assert_eq!(
        cipher.decrypt(&sk, &garbage),
        Err(CryptoError::DecryptionFailed)
    );
}

/// Every decrypt failure must be the same value with the same message, so
/// nothing about the failure mode leaks to a caller.
#[test]
fn all_decrypt_errors_are_uniform() {
    let (cipher, pk, sk) = setup();
    let (_, _, other_sk) = setup();
    let ct = cipher.encrypt(&pk, b"message").unwrap();

    let mut tampered = ct.clone();
    tampered[key_block_start() + 7] ^= 0x01;

    let errors = [
        cipher.decrypt(&other_sk, &ct).unwrap_err(),
        cipher.decrypt(&sk, &tampered).unwrap_err(),
        cipher.decrypt(&sk, &ct[..ct.len() - 4]).unwrap_err(),
        cipher.decrypt(&sk, &[0u8; 64]).unwrap_err(),
    ];
    for err in &errors {
        assert_eq!(*err, CryptoError::DecryptionFailed);
        assert_eq!(err.to_string(), "decryption failed");
    }
}

// ---------------------------------------------------------------------------
// Re-encryption and pair validation
// ---------------------------------------------------------------------------

#[test]
fn reencrypt_to_new_recipient() {
    let (cipher, old_pk, old_sk) = setup();
    let (_, new_pk, new_sk) = setup();

    let ct = cipher.encrypt(&old_pk, b"handover").unwrap();
    let ct2 = cipher.reencrypt(&ct, &old_sk, &new_pk).unwrap();

    assert_eq!(cipher.decrypt(&new_sk, &ct2).unwrap(), b"handover");
    assert_eq!(
        cipher.decrypt(&old_sk, &ct2),
        Err(CryptoError::DecryptionFailed)
    );
}

#[test]
fn reencrypt_with_wrong_secret_fails() {
    let (cipher, pk, _) = setup();
    let (_, new_pk, _) = setup();
    let (_, _, wrong_sk) = setup();
    let ct = cipher.encrypt(&pk, b"handover").unwrap();
    assert_eq!(
        cipher.reencrypt(&ct, &wrong_sk, &new_pk),
        Err(CryptoError::DecryptionFailed)
    );
}

#[test]
fn validate_key_pair_accepts_matching_pair() {
    let (cipher, pk, sk) = setup();
    assert!(cipher.validate_key_pair(&pk, &sk));
}

#[test]
fn validate_key_pair_rejects_mismatched_pair() {
    let (cipher, pk, _) = setup();
    let (_, _, other_sk) = setup();
    assert!(!cipher.validate_key_pair(&pk, &other_sk));
}

#[test]
fn validate_key_pair_rejects_garbage() {
    let (cipher, pk, _) = setup();
    assert!(!cipher.validate_key_pair(&pk, &[0u8; 16]));
    assert!(!cipher.validate_key_pair(&[], &[]));
}

// ---------------------------------------------------------------------------
// Session fast path
// ---------------------------------------------------------------------------

#[test]
fn session_roundtrip() {
    let (cipher, _, _) = setup();
    let blob = cipher.encrypt_with_session_key(b"fast path").unwrap();
    assert_eq!(cipher.decrypt_with_session_key(&blob).unwrap(), b"fast path");
}

#[test]
fn session_rotation_changes_key_and_generation() {
    let (cipher, _, _) = setup();
    let before = cipher.session_key();
    cipher.rotate_session_key().unwrap();
    let after = cipher.session_key();

    assert_ne!(before.as_bytes(), after.as_bytes());
    assert_eq!(after.generation(), before.generation() + 1);
}

#[test]
fn session_blob_does_not_survive_rotation() {
    let (cipher, _, _) = setup();
    let blob = cipher.encrypt_with_session_key(b"stale").unwrap();
    cipher.rotate_session_key().unwrap();
    assert_eq!(
        cipher.decrypt_with_session_key(&blob),
        Err(CryptoError::DecryptionFailed)
    );
}

#[test]
fn session_blob_tamper_fails() {
    let (cipher, _, _) = setup();
    let mut blob = cipher.encrypt_with_session_key(b"fast path").unwrap();
    blob[13] ^= 0x01;
    assert_eq!(
        cipher.decrypt_with_session_key(&blob),
        Err(CryptoError::DecryptionFailed)
    );
}

#[test]
fn session_blob_rejected_by_full_decrypt() {
    let (cipher, _, sk) = setup();
    let blob = cipher.encrypt_with_session_key(b"fast path").unwrap();
    assert_eq!(
        cipher.decrypt(&sk, &blob),
        Err(CryptoError::DecryptionFailed)
    );
}
