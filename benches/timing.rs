//! Wall-clock benchmarks for the hybrid envelope.
//!
//! Run with: `cargo bench --bench timing`
//!
//! Covers key generation per suite, full hybrid seal/open across payload
//! sizes, the symmetric session fast path, and the cost of rejecting
//! corrupt input (which should stay close to the valid-decrypt cost, since
//! rejection happens after the same KEM work).

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use palisade_hybrid::{
    AesGcmCipher, AlgorithmRegistry, HybridCipher, OsRandom, PostQuantumEngine, SoftwareBackend,
    DILITHIUM3, ML_KEM_1024, ML_KEM_768, X25519_ML_KEM_768,
};

/// Payload sizes to benchmark.
const PAYLOAD_SIZES: &[usize] = &[64, 1024, 65_536, 1_048_576];

fn stack() -> (Arc<PostQuantumEngine>, HybridCipher) {
    let registry = Arc::new(AlgorithmRegistry::builtin());
    let engine = Arc::new(PostQuantumEngine::new(
        registry,
        Arc::new(SoftwareBackend::new()),
    ));
    let cipher = HybridCipher::new(
        Arc::clone(&engine),
        Arc::new(AesGcmCipher),
        Arc::new(OsRandom),
    )
    .expect("cipher construction");
    (engine, cipher)
}

// ---------------------------------------------------------------------------
// Key generation per suite
// ---------------------------------------------------------------------------

fn bench_keygen(c: &mut Criterion) {
    let (engine, _) = stack();
    let mut group = c.benchmark_group("keygen");

    for suite in [X25519_ML_KEM_768, ML_KEM_768, ML_KEM_1024, DILITHIUM3] {
        group.bench_function(suite, |b| {
            b.iter(|| engine.generate_key_pair(Some(suite)).expect("keygen"));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Hybrid seal/open across payload sizes
// ---------------------------------------------------------------------------

fn bench_encrypt(c: &mut Criterion) {
    let (_, cipher) = stack();
    let pair = cipher.generate_key_pair().expect("keygen");
    let mut group = c.benchmark_group("encrypt");

    for &size in PAYLOAD_SIZES {
        let plaintext = vec![0x42u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("hybrid", size), &plaintext, |b, pt| {
            b.iter(|| cipher.encrypt(&pair.public_key, pt).expect("encrypt"));
        });
        group.bench_with_input(BenchmarkId::new("session", size), &plaintext, |b, pt| {
            b.iter(|| cipher.encrypt_with_session_key(pt).expect("encrypt"));
        });
    }

    group.finish();
}

fn bench_decrypt(c: &mut Criterion) {
    let (_, cipher) = stack();
    let pair = cipher.generate_key_pair().expect("keygen");
    let secret = pair.secret_key.to_vec();
    let mut group = c.benchmark_group("decrypt");

    for &size in PAYLOAD_SIZES {
        let plaintext = vec![0x42u8; size];
        let ct = cipher.encrypt(&pair.public_key, &plaintext).expect("encrypt");
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("hybrid", size), &ct, |b, ct| {
            b.iter(|| cipher.decrypt(&secret, ct).expect("decrypt"));
        });

        let blob = cipher
            .encrypt_with_session_key(&plaintext)
            .expect("encrypt");
        group.bench_with_input(BenchmarkId::new("session", size), &blob, |b, blob| {
            b.iter(|| cipher.decrypt_with_session_key(blob).expect("decrypt"));
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Rejection cost
// ---------------------------------------------------------------------------

fn bench_reject(c: &mut Criterion) {
    let (_, cipher) = stack();
    let pair = cipher.generate_key_pair().expect("keygen");
    let secret = pair.secret_key.to_vec();
    let ct = cipher
        .encrypt(&pair.public_key, &vec![0x42u8; 1024])
        .expect("encrypt");

    let mut tampered_kem = ct.clone();
    tampered_kem[64] ^= 0x01;
    let mut tampered_tag = ct.clone();
    let last = tampered_tag.len() - 1;
    tampered_tag[last] ^= 0x01;

    let mut group = c.benchmark_group("reject");
    group.bench_function("valid_baseline", |b| {
        b.iter(|| cipher.decrypt(&secret, &ct).expect("decrypt"));
    });
    group.bench_function("tampered_kem_ct", |b| {
        b.iter(|| cipher.decrypt(&secret, &tampered_kem).expect_err("must fail"));
    });
    group.bench_function("tampered_tag", |b| {
        b.iter(|| cipher.decrypt(&secret, &tampered_tag).expect_err("must fail"));
    });
    group.finish();
}

criterion_group!(benches, bench_keygen, bench_encrypt, bench_decrypt, bench_reject);
criterion_main!(benches);
