//! # Palisade Hybrid
//!
//! Quantum-safe hybrid encryption with pluggable primitive backends.
//!
//! A registry of algorithm suites feeds a [`PostQuantumEngine`] that wraps
//! whatever [`PqPrimitive`] backend is plugged in (the crate ships a pure
//! software one). On top sits [`HybridCipher`]: public-key encryption as a
//! KEM-DEM envelope with a self-describing frame, plus a rotating session
//! key for cheap symmetric fast-path traffic.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use palisade_hybrid::{
//!     AesGcmCipher, AlgorithmRegistry, CryptoError, HybridCipher, OsRandom,
//!     PostQuantumEngine, SoftwareBackend,
//! };
//!
//! # fn main() -> Result<(), CryptoError> {
//! let registry = Arc::new(AlgorithmRegistry::builtin());
//! let engine = Arc::new(PostQuantumEngine::new(
//!     registry,
//!     Arc::new(SoftwareBackend::new()),
//! ));
//! let cipher = HybridCipher::new(engine, Arc::new(AesGcmCipher), Arc::new(OsRandom))?;
//!
//! let pair = cipher.generate_key_pair()?;
//! let sealed = cipher.encrypt(&pair.public_key, b"attack at dawn")?;
//! let opened = cipher.decrypt(&pair.secret_key, &sealed)?;
//! assert_eq!(opened, b"attack at dawn");
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Properties
//!
//! - **Hybrid by default**: the default suite combines X25519 with
//!   ML-KEM-768; recovering a data key requires breaking both.
//! - **Fresh key per envelope**: every `encrypt` call wraps a new 256-bit
//!   data key; compromising one envelope reveals nothing about others.
//! - **Bound derivation**: data keys are derived with HKDF-SHA256 over the
//!   shared secret, the SHA3-256 hash of the KEM ciphertext and the suite
//!   name, so ciphertext splicing across suites fails closed.
//! - **Uniform failures**: decrypt reports one error for every parse,
//!   unwrap or authentication failure.
//! - **Wiped secrets**: shared secrets, data keys and secret keys are
//!   zeroized on drop.
//!
//! ## What's NOT Provided
//!
//! - Streaming or chunked encryption (payloads are buffered).
//! - Key transport or distribution; see the companion keystore crate for
//!   storage and lifecycle.
//! - Constant-time guarantees beyond those of the underlying primitive
//!   crates.

#![deny(unsafe_code)]

mod aead;
mod backend;
mod engine;
mod error;
mod hybrid;
mod kdf;
mod kem;
mod provider;
mod registry;

// Wire-format internals, exposed for integration tests and tooling. Not a
// stable API.
#[doc(hidden)]
pub mod wire;

pub use aead::AesGcmCipher;
pub use backend::SoftwareBackend;
pub use engine::PostQuantumEngine;
pub use error::CryptoError;
pub use hybrid::{HybridCipher, SessionKey};
pub use provider::{KeyPair, OsRandom, PqPrimitive, RandomSource, SymmetricCipher};
pub use registry::{
    AlgorithmInfo, AlgorithmRegistry, DILITHIUM2, DILITHIUM3, DILITHIUM5, ML_KEM_1024, ML_KEM_512,
    ML_KEM_768, X25519_ML_KEM_768,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
