//! Error types for the keystore and the facade.

use std::fmt;

use palisade_hybrid::CryptoError;

use crate::types::KeyId;

// ---------------------------------------------------------------------------
// Keystore errors
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeystoreError {
    /// No record with this id.
    KeyNotFound(KeyId),
    /// Rejected key material (names the offending argument).
    InvalidMaterial(&'static str),
    /// Backend I/O or serialization failure.
    Storage(String),
    /// At-rest wrapping could not be applied or undone.
    AtRest(String),
    /// Failure inside the crypto core.
    Crypto(CryptoError),
}

impl fmt::Display for KeystoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyNotFound(id) => write!(f, "key not found: {}", id),
            Self::InvalidMaterial(what) => write!(f, "invalid key material: {}", what),
            Self::Storage(msg) => write!(f, "storage error: {}", msg),
            Self::AtRest(msg) => write!(f, "at-rest wrapping error: {}", msg),
            Self::Crypto(err) => write!(f, "crypto error: {}", err),
        }
    }
}

impl std::error::Error for KeystoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Crypto(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CryptoError> for KeystoreError {
    fn from(err: CryptoError) -> Self {
        Self::Crypto(err)
    }
}

// ---------------------------------------------------------------------------
// Facade errors
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PalisadeError {
    /// Operation requested outside the Ready state.
    NotInitialized,
    /// The facade has been disposed; nothing works anymore.
    Disposed,
    /// `initialize` could not build the component set.
    InitializationFailed(String),
    /// Failure in the key material store.
    Keystore(KeystoreError),
    /// Failure in the crypto core.
    Crypto(CryptoError),
}

impl fmt::Display for PalisadeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "not initialized"),
            Self::Disposed => write!(f, "disposed"),
            Self::InitializationFailed(msg) => write!(f, "initialization failed: {}", msg),
            Self::Keystore(err) => write!(f, "keystore error: {}", err),
            Self::Crypto(err) => write!(f, "crypto error: {}", err),
        }
    }
}

impl std::error::Error for PalisadeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Keystore(err) => Some(err),
            Self::Crypto(err) => Some(err),
            _ => None,
        }
    }
}

impl From<KeystoreError> for PalisadeError {
    fn from(err: KeystoreError) -> Self {
        Self::Keystore(err)
    }
}

impl From<CryptoError> for PalisadeError {
    fn from(err: CryptoError) -> Self {
        Self::Crypto(err)
    }
}
