//! Unified error types for the hybrid-encryption core.

use core::fmt;

/// Errors produced by the hybrid-encryption core.
///
/// Decrypt paths deliberately collapse every parse, unwrap, and
/// authentication failure into [`CryptoError::DecryptionFailed`] so callers
/// cannot distinguish a wrong key from a forged or corrupted ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// A caller-supplied argument was empty or malformed.
    InvalidInput(&'static str),
    /// Algorithm name not present in the registry.
    UnknownAlgorithm(String),
    /// Attempted to register an algorithm name that already exists.
    DuplicateAlgorithm(String),
    /// No default algorithm configured and no recommended fallback exists.
    NoDefaultSet,
    /// Key or signature bytes inconsistent with the registry's declared sizes.
    SizeMismatch {
        algorithm: String,
        expected: usize,
        actual: usize,
    },
    /// Uniform decryption failure: wrong key, tampered or malformed input.
    DecryptionFailed,
    /// A primitive backend failed; only the operation name and the backend's
    /// message are preserved as context.
    OperationFailed { op: &'static str, detail: String },
    /// The random source could not produce bytes.
    RandomFailure,
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(what) => write!(f, "invalid input: {}", what),
            Self::UnknownAlgorithm(name) => write!(f, "unknown algorithm: {}", name),
            Self::DuplicateAlgorithm(name) => {
                write!(f, "algorithm already registered: {}", name)
            }
            Self::NoDefaultSet => write!(f, "no default algorithm set"),
            Self::SizeMismatch {
                algorithm,
                expected,
                actual,
            } => write!(
                f,
                "size mismatch for {}: expected {} bytes, got {}",
                algorithm, expected, actual
            ),
            Self::DecryptionFailed => write!(f, "decryption failed"),
            Self::OperationFailed { op, detail } => {
                write!(f, "crypto operation failed: {}: {}", op, detail)
            }
            Self::RandomFailure => write!(f, "random source failure"),
        }
    }
}

impl std::error::Error for CryptoError {}
