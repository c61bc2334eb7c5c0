//! # Palisade Keystore
//!
//! Key material storage and lifecycle facade over `palisade-hybrid`.
//!
//! Material is wrapped at rest (AES-256-GCM under per-epoch master keys,
//! record id as associated data) and never reaches a storage backend in the
//! clear. The [`Palisade`] facade owns the whole stack (algorithm registry,
//! post-quantum engine, hybrid cipher, key store) behind an explicit
//! initialize / shutdown / dispose lifecycle.
//!
//! ## Quick Start
//!
//! ```ignore
//! use palisade_keystore::*;
//!
//! # tokio_test::block_on(async {
//! let palisade = Palisade::new(PalisadeConfig::default());
//! palisade.initialize().await.unwrap();
//!
//! // Hybrid encryption under the default suite
//! let pair = palisade.generate_key_pair(None).await.unwrap();
//! let ciphertext = palisade.encrypt(&pair.public_key, b"secret data").await.unwrap();
//! let plaintext = palisade.decrypt(&pair.secret_key, &ciphertext).await.unwrap();
//! assert_eq!(plaintext, b"secret data");
//!
//! // Wrapped-at-rest key storage
//! let keystore = palisade.keystore().await.unwrap();
//! let key_id = keystore
//!     .store_key(&pair.secret_key, KeyMetadata::new(&pair.algorithm))
//!     .await
//!     .unwrap();
//! let material = keystore.get_key(&key_id).await.unwrap();
//! # });
//! ```

pub mod config;
pub mod error;
pub mod facade;
pub mod storage;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use config::{PalisadeConfig, StorageChoice};
pub use error::{KeystoreError, PalisadeError};
pub use facade::{LifecycleState, Palisade};
pub use storage::{FileBackend, InMemoryBackend, StorageBackend};
pub use store::KeyMaterialStore;
pub use types::{KeyId, KeyMetadata, KeyRecord, KeyStats};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
