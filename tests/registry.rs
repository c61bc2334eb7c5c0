//! Registry catalog semantics and per-suite engine behavior.

use std::sync::Arc;

use palisade_hybrid::{
    AlgorithmInfo, AlgorithmRegistry, CryptoError, PostQuantumEngine, SoftwareBackend, DILITHIUM2,
    DILITHIUM3, DILITHIUM5, ML_KEM_1024, ML_KEM_512, ML_KEM_768, X25519_ML_KEM_768,
};

fn engine() -> PostQuantumEngine {
    PostQuantumEngine::new(
        Arc::new(AlgorithmRegistry::builtin()),
        Arc::new(SoftwareBackend::new()),
    )
}

// (name, public key bytes, secret key bytes)
const SUITE_SIZES: &[(&str, usize, usize)] = &[
    (ML_KEM_512, 800, 1632),
    (ML_KEM_768, 1184, 2400),
    (ML_KEM_1024, 1568, 3168),
    (X25519_ML_KEM_768, 1216, 2432),
    (DILITHIUM2, 1312, 2528),
    (DILITHIUM3, 1952, 4000),
    (DILITHIUM5, 2592, 4864),
];

// (name, kem ciphertext bytes)
const KEM_CT_SIZES: &[(&str, usize)] = &[
    (ML_KEM_512, 768),
    (ML_KEM_768, 1088),
    (ML_KEM_1024, 1568),
    (X25519_ML_KEM_768, 1120),
];

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[test]
fn builtin_lists_all_suites() {
    let registry = AlgorithmRegistry::builtin();
    let names = registry.list_available();
    assert_eq!(
        names,
        vec![
            DILITHIUM2,
            DILITHIUM3,
            DILITHIUM5,
            ML_KEM_1024,
            ML_KEM_512,
            ML_KEM_768,
            X25519_ML_KEM_768,
        ]
    );
    for name in &names {
        assert!(registry.is_available(name));
    }
}

#[test]
fn builtin_default_is_hybrid() {
    let registry = AlgorithmRegistry::builtin();
    assert_eq!(registry.get_default().unwrap(), X25519_ML_KEM_768);
}

#[test]
fn builtin_recommended_subset() {
    let registry = AlgorithmRegistry::builtin();
    assert_eq!(
        registry.list_recommended(),
        vec![
            DILITHIUM3,
            DILITHIUM5,
            ML_KEM_1024,
            ML_KEM_768,
            X25519_ML_KEM_768,
        ]
    );
}

#[test]
fn get_unknown_algorithm_fails() {
    let registry = AlgorithmRegistry::builtin();
    assert_eq!(
        registry.get("frodo-976"),
        Err(CryptoError::UnknownAlgorithm("frodo-976".to_string()))
    );
    assert!(!registry.is_available("frodo-976"));
}

#[test]
fn register_then_get() {
    let registry = AlgorithmRegistry::new();
    registry
        .register(AlgorithmInfo::kem("toy-kem", 1, 64, true, "toy"))
        .unwrap();
    let info = registry.get("toy-kem").unwrap();
    assert_eq!(info.key_size, 64);
    assert!(info.is_kem());
}

#[test]
fn register_duplicate_fails() {
    let registry = AlgorithmRegistry::builtin();
    assert_eq!(
        registry.register(AlgorithmInfo::kem(ML_KEM_768, 3, 1184, true, "dup")),
        Err(CryptoError::DuplicateAlgorithm(ML_KEM_768.to_string()))
    );
}

#[test]
fn set_default_requires_registered_name() {
    let registry = AlgorithmRegistry::builtin();
    assert_eq!(
        registry.set_default("frodo-976"),
        Err(CryptoError::UnknownAlgorithm("frodo-976".to_string()))
    );
    registry.set_default(ML_KEM_1024).unwrap();
    assert_eq!(registry.get_default().unwrap(), ML_KEM_1024);
}

#[test]
fn empty_registry_has_no_default() {
    let registry = AlgorithmRegistry::new();
    assert_eq!(registry.get_default(), Err(CryptoError::NoDefaultSet));
}

#[test]
fn default_falls_back_to_strongest_recommended() {
    let registry = AlgorithmRegistry::new();
    registry
        .register(AlgorithmInfo::kem("weak", 1, 32, true, ""))
        .unwrap();
    registry
        .register(AlgorithmInfo::kem("strong", 5, 32, true, ""))
        .unwrap();
    registry
        .register(AlgorithmInfo::kem("stronger-but-ignored", 5, 32, false, ""))
        .unwrap();
    assert_eq!(registry.get_default().unwrap(), "strong");
}

#[test]
fn default_fallback_breaks_level_ties_by_name() {
    let registry = AlgorithmRegistry::new();
    registry
        .register(AlgorithmInfo::kem("zeta", 5, 32, true, ""))
        .unwrap();
    registry
        .register(AlgorithmInfo::kem("alpha", 5, 32, true, ""))
        .unwrap();
    assert_eq!(registry.get_default().unwrap(), "alpha");
}

#[test]
fn default_fallback_ignores_unrecommended() {
    let registry = AlgorithmRegistry::new();
    registry
        .register(AlgorithmInfo::kem("legacy", 5, 32, false, ""))
        .unwrap();
    assert_eq!(registry.get_default(), Err(CryptoError::NoDefaultSet));
}

// ---------------------------------------------------------------------------
// Key generation
// ---------------------------------------------------------------------------

#[test]
fn generated_keys_match_registry_sizes() {
    let engine = engine();
    for &(name, pk_len, sk_len) in SUITE_SIZES {
        let pair = engine.generate_key_pair(Some(name)).unwrap();
        assert_eq!(pair.algorithm, name);
        assert_eq!(pair.public_key.len(), pk_len, "{name} public key");
        assert_eq!(pair.secret_key.len(), sk_len, "{name} secret key");
    }
}

#[test]
fn default_suite_resolution() {
    let engine = engine();
    let pair = engine.generate_key_pair(None).unwrap();
    assert_eq!(pair.algorithm, X25519_ML_KEM_768);
}

#[test]
fn unknown_suite_fails() {
    let engine = engine();
    assert_eq!(
        engine.generate_key_pair(Some("frodo-976")).unwrap_err(),
        CryptoError::UnknownAlgorithm("frodo-976".to_string())
    );
}

// ---------------------------------------------------------------------------
// KEM suites
// ---------------------------------------------------------------------------

#[test]
fn engine_roundtrip_every_kem_suite() {
    let engine = engine();
    let msg = b"per-suite roundtrip";
    for &(name, ct_len) in KEM_CT_SIZES {
        let pair = engine.generate_key_pair(Some(name)).unwrap();
        let ct = engine.encrypt(Some(name), &pair.public_key, msg).unwrap();
        // kem ciphertext || nonce || sealed payload
        assert_eq!(ct.len(), ct_len + 12 + msg.len() + 16, "{name} frame");
        let pt = engine.decrypt(Some(name), &pair.secret_key, &ct).unwrap();
        assert_eq!(pt, msg, "{name} roundtrip");
    }
}

#[test]
fn engine_decrypt_with_wrong_key_fails() {
    let engine = engine();
    let alice = engine.generate_key_pair(Some(ML_KEM_768)).unwrap();
    let mallory = engine.generate_key_pair(Some(ML_KEM_768)).unwrap();
    let ct = engine
        .encrypt(Some(ML_KEM_768), &alice.public_key, b"secret")
        .unwrap();
    assert_eq!(
        engine.decrypt(Some(ML_KEM_768), &mallory.secret_key, &ct),
        Err(CryptoError::DecryptionFailed)
    );
}

#[test]
fn encrypt_with_wrong_size_public_key_fails() {
    let engine = engine();
    let pair = engine.generate_key_pair(Some(ML_KEM_768)).unwrap();
    let err = engine
        .encrypt(Some(ML_KEM_768), &pair.public_key[..100], b"secret")
        .unwrap_err();
    assert_eq!(
        err,
        CryptoError::SizeMismatch {
            algorithm: ML_KEM_768.to_string(),
            expected: 1184,
            actual: 100,
        }
    );
}

#[test]
fn kem_suite_cannot_sign() {
    let engine = engine();
    let pair = engine.generate_key_pair(Some(ML_KEM_768)).unwrap();
    assert_eq!(
        engine.sign(Some(ML_KEM_768), &pair.secret_key, b"data"),
        Err(CryptoError::InvalidInput("not a signature algorithm"))
    );
}

#[test]
fn signature_suite_cannot_encrypt() {
    let engine = engine();
    let pair = engine.generate_key_pair(Some(DILITHIUM3)).unwrap();
    assert_eq!(
        engine.encrypt(Some(DILITHIUM3), &pair.public_key, b"data"),
        Err(CryptoError::InvalidInput("not an encryption algorithm"))
    );
    assert_eq!(
        engine.decrypt(Some(DILITHIUM3), &pair.secret_key, &[1, 2, 3]),
        Err(CryptoError::InvalidInput("not an encryption algorithm"))
    );
}

// ---------------------------------------------------------------------------
// Signature suites
// ---------------------------------------------------------------------------

#[test]
fn sign_verify_every_dilithium_level() {
    let engine = engine();
    for (name, sig_len) in [(DILITHIUM2, 2420), (DILITHIUM3, 3293), (DILITHIUM5, 4595)] {
        let pair = engine.generate_key_pair(Some(name)).unwrap();
        let sig = engine
            .sign(Some(name), &pair.secret_key, b"signed payload")
            .unwrap();
        assert_eq!(sig.len(), sig_len, "{name} signature");
        assert!(engine
            .verify(Some(name), &pair.public_key, b"signed payload", &sig)
            .unwrap());
    }
}

#[test]
fn tampered_message_fails_verification() {
    let engine = engine();
    let pair = engine.generate_key_pair(Some(DILITHIUM3)).unwrap();
    let sig = engine
        .sign(Some(DILITHIUM3), &pair.secret_key, b"signed payload")
        .unwrap();
    assert!(!engine
        .verify(Some(DILITHIUM3), &pair.public_key, b"Signed payload", &sig)
        .unwrap());
}

#[test]
fn tampered_signature_fails_verification() {
    let engine = engine();
    let pair = engine.generate_key_pair(Some(DILITHIUM3)).unwrap();
    let mut sig = engine
        .sign(Some(DILITHIUM3), &pair.secret_key, b"signed payload")
        .unwrap();
    sig[17] ^= 0x01;
    assert!(!engine
        .verify(Some(DILITHIUM3), &pair.public_key, b"signed payload", &sig)
        .unwrap());
}

#[test]
fn wrong_length_signature_is_false_not_error() {
    let engine = engine();
    let pair = engine.generate_key_pair(Some(DILITHIUM3)).unwrap();
    let sig = engine
        .sign(Some(DILITHIUM3), &pair.secret_key, b"signed payload")
        .unwrap();
    let verdict = engine
        .verify(Some(DILITHIUM3), &pair.public_key, b"signed payload", &sig[..sig.len() - 1])
        .unwrap();
    assert!(!verdict);
    assert!(!engine
        .verify(Some(DILITHIUM3), &pair.public_key, b"signed payload", &[])
        .unwrap());
}

#[test]
fn verification_is_bound_to_the_signer() {
    let engine = engine();
    let alice = engine.generate_key_pair(Some(DILITHIUM3)).unwrap();
    let mallory = engine.generate_key_pair(Some(DILITHIUM3)).unwrap();
    let sig = engine
        .sign(Some(DILITHIUM3), &alice.secret_key, b"signed payload")
        .unwrap();
    assert!(!engine
        .verify(Some(DILITHIUM3), &mallory.public_key, b"signed payload", &sig)
        .unwrap());
}

#[test]
fn verify_with_wrong_size_public_key_fails() {
    let engine = engine();
    let pair = engine.generate_key_pair(Some(DILITHIUM3)).unwrap();
    let sig = engine
        .sign(Some(DILITHIUM3), &pair.secret_key, b"signed payload")
        .unwrap();
    assert!(matches!(
        engine.verify(Some(DILITHIUM3), &pair.public_key[..64], b"signed payload", &sig),
        Err(CryptoError::SizeMismatch { .. })
    ));
}

#[test]
fn sign_empty_data_rejected() {
    let engine = engine();
    let pair = engine.generate_key_pair(Some(DILITHIUM3)).unwrap();
    assert_eq!(
        engine.sign(Some(DILITHIUM3), &pair.secret_key, b""),
        Err(CryptoError::InvalidInput("data"))
    );
}

// ---------------------------------------------------------------------------
// Material validation
// ---------------------------------------------------------------------------

#[test]
fn validate_material_checks_suite_lengths() {
    let engine = engine();
    let pair = engine.generate_key_pair(Some(ML_KEM_768)).unwrap();

    assert!(engine.validate_material(ML_KEM_768, &pair.public_key));
    assert!(engine.validate_material(ML_KEM_768, &pair.secret_key));
    assert!(!engine.validate_material(ML_KEM_768, &[0u8; 5]));
    assert!(!engine.validate_material(ML_KEM_1024, &pair.public_key));
    assert!(!engine.validate_material("frodo-976", &pair.public_key));
    assert!(!engine.validate_material(ML_KEM_768, &[]));
}
