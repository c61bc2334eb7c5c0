//! Key encapsulation: the ML-KEM families and the hybrid X25519 + ML-KEM-768
//! construction.
//!
//! All keys and ciphertexts cross this boundary as plain bytes with fixed
//! per-family layouts. The hybrid family concatenates classical and
//! post-quantum halves:
//!
//! ```text
//! public key  = x25519_pk (32) || mlkem_ek (1184)
//! secret key  = x25519_sk (32) || mlkem_dk (2400)
//! ciphertext  = eph_x25519_pk (32) || mlkem_ct (1088)
//! shared      = x25519_dh (32) || mlkem_ss (32)
//! ```
//!
//! An attacker must break BOTH primitives to recover the hybrid shared
//! secret.

use ml_kem::kem::{Decapsulate, Encapsulate};
use ml_kem::{
    Ciphertext, EncodedSizeUser, KemCore, MlKem1024, MlKem1024Params, MlKem512, MlKem512Params,
    MlKem768, MlKem768Params,
};
use rand_core::OsRng;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::CryptoError;

// ---------------------------------------------------------------------------
// Sizes (bytes)
// ---------------------------------------------------------------------------

pub(crate) const X25519_KEY_BYTES: usize = 32;
pub(crate) const SHARED_SECRET_BYTES: usize = 32;

pub(crate) const MLKEM512_PUBLIC_KEY_BYTES: usize = 800;
pub(crate) const MLKEM512_SECRET_KEY_BYTES: usize = 1632;
pub(crate) const MLKEM512_CIPHERTEXT_BYTES: usize = 768;

pub(crate) const MLKEM768_PUBLIC_KEY_BYTES: usize = 1184;
pub(crate) const MLKEM768_SECRET_KEY_BYTES: usize = 2400;
pub(crate) const MLKEM768_CIPHERTEXT_BYTES: usize = 1088;

pub(crate) const MLKEM1024_PUBLIC_KEY_BYTES: usize = 1568;
pub(crate) const MLKEM1024_SECRET_KEY_BYTES: usize = 3168;
pub(crate) const MLKEM1024_CIPHERTEXT_BYTES: usize = 1568;

pub(crate) const HYBRID_PUBLIC_KEY_BYTES: usize = X25519_KEY_BYTES + MLKEM768_PUBLIC_KEY_BYTES;
pub(crate) const HYBRID_SECRET_KEY_BYTES: usize = X25519_KEY_BYTES + MLKEM768_SECRET_KEY_BYTES;
pub(crate) const HYBRID_CIPHERTEXT_BYTES: usize = X25519_KEY_BYTES + MLKEM768_CIPHERTEXT_BYTES;

type Ek512 = ml_kem::kem::EncapsulationKey<MlKem512Params>;
type Dk512 = ml_kem::kem::DecapsulationKey<MlKem512Params>;
type Ek768 = ml_kem::kem::EncapsulationKey<MlKem768Params>;
type Dk768 = ml_kem::kem::DecapsulationKey<MlKem768Params>;
type Ek1024 = ml_kem::kem::EncapsulationKey<MlKem1024Params>;
type Dk1024 = ml_kem::kem::DecapsulationKey<MlKem1024Params>;

// ---------------------------------------------------------------------------
// Family dispatch
// ---------------------------------------------------------------------------

/// One key-encapsulation family. Resolved once per call from the suite table;
/// all byte-level layout knowledge lives here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum KemAlgorithm {
    MlKem512,
    MlKem768,
    MlKem1024,
    HybridX25519MlKem768,
}

impl KemAlgorithm {
    pub(crate) fn public_key_size(self) -> usize {
        match self {
            Self::MlKem512 => MLKEM512_PUBLIC_KEY_BYTES,
            Self::MlKem768 => MLKEM768_PUBLIC_KEY_BYTES,
            Self::MlKem1024 => MLKEM1024_PUBLIC_KEY_BYTES,
            Self::HybridX25519MlKem768 => HYBRID_PUBLIC_KEY_BYTES,
        }
    }

    pub(crate) fn secret_key_size(self) -> usize {
        match self {
            Self::MlKem512 => MLKEM512_SECRET_KEY_BYTES,
            Self::MlKem768 => MLKEM768_SECRET_KEY_BYTES,
            Self::MlKem1024 => MLKEM1024_SECRET_KEY_BYTES,
            Self::HybridX25519MlKem768 => HYBRID_SECRET_KEY_BYTES,
        }
    }

    pub(crate) fn ciphertext_size(self) -> usize {
        match self {
            Self::MlKem512 => MLKEM512_CIPHERTEXT_BYTES,
            Self::MlKem768 => MLKEM768_CIPHERTEXT_BYTES,
            Self::MlKem1024 => MLKEM1024_CIPHERTEXT_BYTES,
            Self::HybridX25519MlKem768 => HYBRID_CIPHERTEXT_BYTES,
        }
    }

    /// Generate a fresh key pair, returned as raw encoded bytes.
    pub(crate) fn generate(self) -> (Vec<u8>, Zeroizing<Vec<u8>>) {
        match self {
            Self::MlKem512 => mlkem512_generate(),
            Self::MlKem768 => mlkem768_generate(),
            Self::MlKem1024 => mlkem1024_generate(),
            Self::HybridX25519MlKem768 => hybrid_generate(),
        }
    }

    /// Encapsulate to `public_key`, returning the shared secret and the KEM
    /// ciphertext.
    pub(crate) fn encapsulate(
        self,
        public_key: &[u8],
    ) -> Result<(Zeroizing<Vec<u8>>, Vec<u8>), CryptoError> {
        match self {
            Self::MlKem512 => mlkem512_encapsulate(public_key),
            Self::MlKem768 => mlkem768_encapsulate(public_key),
            Self::MlKem1024 => mlkem1024_encapsulate(public_key),
            Self::HybridX25519MlKem768 => hybrid_encapsulate(public_key),
        }
    }

    /// Recover the shared secret. All failures collapse to
    /// [`CryptoError::DecryptionFailed`].
    pub(crate) fn decapsulate(
        self,
        secret_key: &[u8],
        kem_ct: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        match self {
            Self::MlKem512 => mlkem512_decapsulate(secret_key, kem_ct),
            Self::MlKem768 => mlkem768_decapsulate(secret_key, kem_ct),
            Self::MlKem1024 => mlkem1024_decapsulate(secret_key, kem_ct),
            Self::HybridX25519MlKem768 => hybrid_decapsulate(secret_key, kem_ct),
        }
    }
}

// ---------------------------------------------------------------------------
// ML-KEM-512
// ---------------------------------------------------------------------------

fn mlkem512_generate() -> (Vec<u8>, Zeroizing<Vec<u8>>) {
    let (dk, ek) = MlKem512::generate(&mut OsRng);
    (
        ek.as_bytes().as_slice().to_vec(),
        Zeroizing::new(dk.as_bytes().as_slice().to_vec()),
    )
}

fn mlkem512_encapsulate(public_key: &[u8]) -> Result<(Zeroizing<Vec<u8>>, Vec<u8>), CryptoError> {
    let pk: [u8; MLKEM512_PUBLIC_KEY_BYTES] = public_key
        .try_into()
        .map_err(|_| CryptoError::InvalidInput("public key length"))?;
    let ek = Ek512::from_bytes(&pk.into());
    let (ct, ss) = ek
        .encapsulate(&mut OsRng)
        .map_err(|_| CryptoError::OperationFailed {
            op: "encapsulate",
            detail: "ml-kem-512 rejected the public key".to_string(),
        })?;
    Ok((
        Zeroizing::new(ss.as_slice().to_vec()),
        ct.as_slice().to_vec(),
    ))
}

fn mlkem512_decapsulate(
    secret_key: &[u8],
    kem_ct: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let sk: [u8; MLKEM512_SECRET_KEY_BYTES] = secret_key
        .try_into()
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let dk = Dk512::from_bytes(&sk.into());
    let ct =
        Ciphertext::<MlKem512>::try_from(kem_ct).map_err(|_| CryptoError::DecryptionFailed)?;
    let ss = dk.decapsulate(&ct).map_err(|_| CryptoError::DecryptionFailed)?;
    Ok(Zeroizing::new(ss.as_slice().to_vec()))
}

// ---------------------------------------------------------------------------
// ML-KEM-768
// ---------------------------------------------------------------------------

fn mlkem768_generate() -> (Vec<u8>, Zeroizing<Vec<u8>>) {
    let (dk, ek) = MlKem768::generate(&mut OsRng);
    (
        ek.as_bytes().as_slice().to_vec(),
        Zeroizing::new(dk.as_bytes().as_slice().to_vec()),
    )
}

fn mlkem768_encapsulate(public_key: &[u8]) -> Result<(Zeroizing<Vec<u8>>, Vec<u8>), CryptoError> {
    let pk: [u8; MLKEM768_PUBLIC_KEY_BYTES] = public_key
        .try_into()
        .map_err(|_| CryptoError::InvalidInput("public key length"))?;
    let ek = Ek768::from_bytes(&pk.into());
    let (ct, ss) = ek
        .encapsulate(&mut OsRng)
        .map_err(|_| CryptoError::OperationFailed {
            op: "encapsulate",
            detail: "ml-kem-768 rejected the public key".to_string(),
        })?;
    Ok((
        Zeroizing::new(ss.as_slice().to_vec()),
        ct.as_slice().to_vec(),
    ))
}

fn mlkem768_decapsulate(
    secret_key: &[u8],
    kem_ct: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let sk: [u8; MLKEM768_SECRET_KEY_BYTES] = secret_key
        .try_into()
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let dk = Dk768::from_bytes(&sk.into());
    let ct =
        Ciphertext::<MlKem768>::try_from(kem_ct).map_err(|_| CryptoError::DecryptionFailed)?;
    let ss = dk.decapsulate(&ct).map_err(|_| CryptoError::DecryptionFailed)?;
    Ok(Zeroizing::new(ss.as_slice().to_vec()))
}

// ---------------------------------------------------------------------------
// ML-KEM-1024
// ---------------------------------------------------------------------------

fn mlkem1024_generate() -> (Vec<u8>, Zeroizing<Vec<u8>>) {
    let (dk, ek) = MlKem1024::generate(&mut OsRng);
    (
        ek.as_bytes().as_slice().to_vec(),
        Zeroizing::new(dk.as_bytes().as_slice().to_vec()),
    )
}

fn mlkem1024_encapsulate(public_key: &[u8]) -> Result<(Zeroizing<Vec<u8>>, Vec<u8>), CryptoError> {
    let pk: [u8; MLKEM1024_PUBLIC_KEY_BYTES] = public_key
        .try_into()
        .map_err(|_| CryptoError::InvalidInput("public key length"))?;
    let ek = Ek1024::from_bytes(&pk.into());
    let (ct, ss) = ek
        .encapsulate(&mut OsRng)
        .map_err(|_| CryptoError::OperationFailed {
            op: "encapsulate",
            detail: "ml-kem-1024 rejected the public key".to_string(),
        })?;
    Ok((
        Zeroizing::new(ss.as_slice().to_vec()),
        ct.as_slice().to_vec(),
    ))
}

fn mlkem1024_decapsulate(
    secret_key: &[u8],
    kem_ct: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let sk: [u8; MLKEM1024_SECRET_KEY_BYTES] = secret_key
        .try_into()
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let dk = Dk1024::from_bytes(&sk.into());
    let ct =
        Ciphertext::<MlKem1024>::try_from(kem_ct).map_err(|_| CryptoError::DecryptionFailed)?;
    let ss = dk.decapsulate(&ct).map_err(|_| CryptoError::DecryptionFailed)?;
    Ok(Zeroizing::new(ss.as_slice().to_vec()))
}

// ---------------------------------------------------------------------------
// Hybrid X25519 + ML-KEM-768
// ---------------------------------------------------------------------------

fn hybrid_generate() -> (Vec<u8>, Zeroizing<Vec<u8>>) {
    let x_sk = StaticSecret::random_from_rng(OsRng);
    let x_pk = X25519PublicKey::from(&x_sk);
    let (mlkem_dk, mlkem_ek) = MlKem768::generate(&mut OsRng);

    let mut public_key = Vec::with_capacity(HYBRID_PUBLIC_KEY_BYTES);
    public_key.extend_from_slice(x_pk.as_bytes());
    public_key.extend_from_slice(mlkem_ek.as_bytes().as_slice());

    let mut secret_key = Zeroizing::new(Vec::with_capacity(HYBRID_SECRET_KEY_BYTES));
    secret_key.extend_from_slice(&x_sk.to_bytes());
    secret_key.extend_from_slice(mlkem_dk.as_bytes().as_slice());

    (public_key, secret_key)
}

fn hybrid_encapsulate(public_key: &[u8]) -> Result<(Zeroizing<Vec<u8>>, Vec<u8>), CryptoError> {
    if public_key.len() != HYBRID_PUBLIC_KEY_BYTES {
        return Err(CryptoError::InvalidInput("public key length"));
    }
    let x_pk_bytes: [u8; X25519_KEY_BYTES] = public_key[..X25519_KEY_BYTES]
        .try_into()
        .map_err(|_| CryptoError::InvalidInput("public key length"))?;
    let x_pk = X25519PublicKey::from(x_pk_bytes);
    let mlkem_bytes: [u8; MLKEM768_PUBLIC_KEY_BYTES] = public_key[X25519_KEY_BYTES..]
        .try_into()
        .map_err(|_| CryptoError::InvalidInput("public key length"))?;
    let mlkem_ek = Ek768::from_bytes(&mlkem_bytes.into());

    let eph_sk = EphemeralSecret::random_from_rng(OsRng);
    let eph_pk = X25519PublicKey::from(&eph_sk);
    let dh = eph_sk.diffie_hellman(&x_pk);

    let (mlkem_ct, mlkem_ss) =
        mlkem_ek
            .encapsulate(&mut OsRng)
            .map_err(|_| CryptoError::OperationFailed {
                op: "encapsulate",
                detail: "ml-kem-768 rejected the public key".to_string(),
            })?;

    let mut shared = Zeroizing::new(Vec::with_capacity(2 * SHARED_SECRET_BYTES));
    shared.extend_from_slice(dh.as_bytes());
    shared.extend_from_slice(mlkem_ss.as_slice());

    let mut kem_ct = Vec::with_capacity(HYBRID_CIPHERTEXT_BYTES);
    kem_ct.extend_from_slice(eph_pk.as_bytes());
    kem_ct.extend_from_slice(mlkem_ct.as_slice());

    Ok((shared, kem_ct))
}

fn hybrid_decapsulate(secret_key: &[u8], kem_ct: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if secret_key.len() != HYBRID_SECRET_KEY_BYTES || kem_ct.len() != HYBRID_CIPHERTEXT_BYTES {
        return Err(CryptoError::DecryptionFailed);
    }
    let x_sk_bytes: [u8; X25519_KEY_BYTES] = secret_key[..X25519_KEY_BYTES]
        .try_into()
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let x_sk = StaticSecret::from(x_sk_bytes);
    let mlkem_bytes: [u8; MLKEM768_SECRET_KEY_BYTES] = secret_key[X25519_KEY_BYTES..]
        .try_into()
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let mlkem_dk = Dk768::from_bytes(&mlkem_bytes.into());

    let eph_pk_bytes: [u8; X25519_KEY_BYTES] = kem_ct[..X25519_KEY_BYTES]
        .try_into()
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let eph_pk = X25519PublicKey::from(eph_pk_bytes);
    let dh = x_sk.diffie_hellman(&eph_pk);

    let mlkem_ct = Ciphertext::<MlKem768>::try_from(&kem_ct[X25519_KEY_BYTES..])
        .map_err(|_| CryptoError::DecryptionFailed)?;
    let mlkem_ss = mlkem_dk
        .decapsulate(&mlkem_ct)
        .map_err(|_| CryptoError::DecryptionFailed)?;

    let mut shared = Zeroizing::new(Vec::with_capacity(2 * SHARED_SECRET_BYTES));
    shared.extend_from_slice(dh.as_bytes());
    shared.extend_from_slice(mlkem_ss.as_slice());
    Ok(shared)
}
