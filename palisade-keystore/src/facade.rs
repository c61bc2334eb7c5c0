//! The Palisade facade: one owned context over registry, engine, hybrid
//! cipher, and key material store, with an explicit lifecycle.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use sha3::{Digest, Sha3_256};
use subtle::ConstantTimeEq;
use tokio::sync::{RwLock, RwLockReadGuard};

use palisade_hybrid::{
    AesGcmCipher, AlgorithmRegistry, CryptoError, HybridCipher, KeyPair, OsRandom,
    PostQuantumEngine, RandomSource, SessionKey, SoftwareBackend,
};

use crate::config::{PalisadeConfig, StorageChoice};
use crate::error::PalisadeError;
use crate::storage::{FileBackend, InMemoryBackend, StorageBackend};
use crate::store::KeyMaterialStore;

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Facade lifecycle state.
///
/// ```text
/// Uninitialized → Initializing → Ready → ShuttingDown → Uninitialized
///        │                         │
///        └───────── dispose ───────┴──→ Disposed (absorbing)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
    ShuttingDown,
    Disposed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "UNINITIALIZED"),
            Self::Initializing => write!(f, "INITIALIZING"),
            Self::Ready => write!(f, "READY"),
            Self::ShuttingDown => write!(f, "SHUTTING_DOWN"),
            Self::Disposed => write!(f, "DISPOSED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

struct Components {
    registry: Arc<AlgorithmRegistry>,
    engine: Arc<PostQuantumEngine>,
    hybrid: Arc<HybridCipher>,
    store: Arc<KeyMaterialStore>,
    random: Arc<dyn RandomSource>,
    session_started: Mutex<Instant>,
}

fn build_components(config: &PalisadeConfig) -> Result<Components, PalisadeError> {
    let registry = Arc::new(AlgorithmRegistry::builtin());
    if let Some(name) = &config.default_algorithm {
        registry.set_default(name).map_err(|e| {
            PalisadeError::InitializationFailed(format!("default algorithm: {}", e))
        })?;
    }

    let backend: Arc<dyn StorageBackend> = match &config.storage {
        StorageChoice::Memory => Arc::new(InMemoryBackend::new()),
        StorageChoice::Directory(dir) => Arc::new(
            FileBackend::new(dir.clone())
                .map_err(|e| PalisadeError::InitializationFailed(format!("storage: {}", e)))?,
        ),
    };

    let engine = Arc::new(PostQuantumEngine::new(
        Arc::clone(&registry),
        Arc::new(SoftwareBackend::new()),
    ));
    let random: Arc<dyn RandomSource> = Arc::new(OsRandom);
    let hybrid = Arc::new(
        HybridCipher::new(Arc::clone(&engine), Arc::new(AesGcmCipher), Arc::clone(&random))
            .map_err(|e| PalisadeError::InitializationFailed(format!("session key: {}", e)))?,
    );
    let store = Arc::new(KeyMaterialStore::new(backend, Arc::clone(&engine)));

    Ok(Components {
        registry,
        engine,
        hybrid,
        store,
        random,
        session_started: Mutex::new(Instant::now()),
    })
}

struct FacadeInner {
    state: LifecycleState,
    components: Option<Components>,
}

// ---------------------------------------------------------------------------
// Facade
// ---------------------------------------------------------------------------

/// Owned entry point over the whole stack. Construction is cheap; nothing
/// works until [`Palisade::initialize`].
///
/// In-flight operations hold a read guard on the lifecycle, so `dispose`
/// (which takes the write side) waits for them to drain and no operation
/// ever observes components mid-teardown.
pub struct Palisade {
    config: PalisadeConfig,
    inner: RwLock<FacadeInner>,
}

impl Palisade {
    pub fn new(config: PalisadeConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(FacadeInner {
                state: LifecycleState::Uninitialized,
                components: None,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Build the component set. Idempotent when already Ready. On failure
    /// the facade returns to Uninitialized and may be initialized again.
    pub async fn initialize(&self) -> Result<(), PalisadeError> {
        let mut inner = self.inner.write().await;
        match inner.state {
            LifecycleState::Disposed => return Err(PalisadeError::Disposed),
            LifecycleState::Ready => return Ok(()),
            _ => {}
        }
        inner.state = LifecycleState::Initializing;
        match build_components(&self.config) {
            Ok(components) => {
                inner.components = Some(components);
                inner.state = LifecycleState::Ready;
                tracing::info!(storage = ?self.config.storage, "initialized");
                Ok(())
            }
            Err(err) => {
                inner.components = None;
                inner.state = LifecycleState::Uninitialized;
                Err(err)
            }
        }
    }

    /// Release the components and return to Uninitialized. Idempotent.
    pub async fn shutdown(&self) -> Result<(), PalisadeError> {
        let mut inner = self.inner.write().await;
        match inner.state {
            LifecycleState::Disposed => return Err(PalisadeError::Disposed),
            LifecycleState::Uninitialized => return Ok(()),
            _ => {}
        }
        inner.state = LifecycleState::ShuttingDown;
        inner.components = None;
        inner.state = LifecycleState::Uninitialized;
        tracing::info!("shut down");
        Ok(())
    }

    /// Tear down permanently. Every later call, `initialize` included,
    /// fails with [`PalisadeError::Disposed`]. Idempotent.
    pub async fn dispose(&self) {
        let mut inner = self.inner.write().await;
        if inner.state == LifecycleState::Disposed {
            return;
        }
        inner.components = None;
        inner.state = LifecycleState::Disposed;
        tracing::info!("disposed");
    }

    /// Current lifecycle state. Allowed in any state.
    pub async fn state(&self) -> LifecycleState {
        self.inner.read().await.state
    }

    /// Whether the facade is Ready. Allowed in any state.
    pub async fn is_initialized(&self) -> bool {
        self.state().await == LifecycleState::Ready
    }

    /// Crate version string.
    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Ready gate: read-guarded access to the component set.
    async fn components(
        &self,
    ) -> Result<RwLockReadGuard<'_, Components>, PalisadeError> {
        let inner = self.inner.read().await;
        match inner.state {
            LifecycleState::Ready => {}
            LifecycleState::Disposed => return Err(PalisadeError::Disposed),
            _ => return Err(PalisadeError::NotInitialized),
        }
        RwLockReadGuard::try_map(inner, |i| i.components.as_ref())
            .map_err(|_| PalisadeError::NotInitialized)
    }

    /// Rotate the session key when it is older than the configured ceiling.
    fn refresh_session(&self, components: &Components) -> Result<(), PalisadeError> {
        let secs = match self.config.session_rotate_secs {
            Some(secs) => secs,
            None => return Ok(()),
        };
        let mut started = components.session_started.lock().unwrap();
        if started.elapsed() >= Duration::from_secs(secs) {
            components.hybrid.rotate_session_key()?;
            *started = Instant::now();
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Component accessors (gated Arc handles)
    // -----------------------------------------------------------------------

    pub async fn registry(&self) -> Result<Arc<AlgorithmRegistry>, PalisadeError> {
        Ok(Arc::clone(&self.components().await?.registry))
    }

    pub async fn engine(&self) -> Result<Arc<PostQuantumEngine>, PalisadeError> {
        Ok(Arc::clone(&self.components().await?.engine))
    }

    pub async fn hybrid(&self) -> Result<Arc<HybridCipher>, PalisadeError> {
        Ok(Arc::clone(&self.components().await?.hybrid))
    }

    pub async fn keystore(&self) -> Result<Arc<KeyMaterialStore>, PalisadeError> {
        Ok(Arc::clone(&self.components().await?.store))
    }

    // -----------------------------------------------------------------------
    // Crypto operations
    // -----------------------------------------------------------------------

    /// Key pair for the named suite, or the registry default when `None`.
    pub async fn generate_key_pair(
        &self,
        algorithm: Option<&str>,
    ) -> Result<KeyPair, PalisadeError> {
        let c = self.components().await?;
        Ok(c.engine.generate_key_pair(algorithm)?)
    }

    /// Hybrid-encrypt `data` to `public_key` under the default suite.
    pub async fn encrypt(&self, public_key: &[u8], data: &[u8]) -> Result<Vec<u8>, PalisadeError> {
        let c = self.components().await?;
        self.refresh_session(&c)?;
        Ok(c.hybrid.encrypt(public_key, data)?)
    }

    /// Inverse of [`Palisade::encrypt`].
    pub async fn decrypt(
        &self,
        secret_key: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, PalisadeError> {
        let c = self.components().await?;
        Ok(c.hybrid.decrypt(secret_key, ciphertext)?)
    }

    /// Detached signature under the named (or default) signature suite.
    pub async fn sign(
        &self,
        algorithm: Option<&str>,
        secret_key: &[u8],
        data: &[u8],
    ) -> Result<Vec<u8>, PalisadeError> {
        let c = self.components().await?;
        Ok(c.engine.sign(algorithm, secret_key, data)?)
    }

    /// Verify a detached signature.
    pub async fn verify(
        &self,
        algorithm: Option<&str>,
        public_key: &[u8],
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, PalisadeError> {
        let c = self.components().await?;
        Ok(c.engine.verify(algorithm, public_key, data, signature)?)
    }

    pub async fn validate_key_pair(
        &self,
        public_key: &[u8],
        secret_key: &[u8],
    ) -> Result<bool, PalisadeError> {
        let c = self.components().await?;
        Ok(c.hybrid.validate_key_pair(public_key, secret_key))
    }

    /// Snapshot of the current session key.
    pub async fn session_key(&self) -> Result<SessionKey, PalisadeError> {
        let c = self.components().await?;
        self.refresh_session(&c)?;
        Ok(c.hybrid.session_key())
    }

    pub async fn rotate_session_key(&self) -> Result<(), PalisadeError> {
        let c = self.components().await?;
        c.hybrid.rotate_session_key()?;
        *c.session_started.lock().unwrap() = Instant::now();
        Ok(())
    }

    /// Name of the suite used when callers pass no algorithm.
    pub async fn default_algorithm(&self) -> Result<String, PalisadeError> {
        let c = self.components().await?;
        Ok(c.registry.get_default()?)
    }

    // -----------------------------------------------------------------------
    // Utility operations
    // -----------------------------------------------------------------------

    /// `len` bytes from the operating-system RNG.
    pub async fn generate_random_bytes(&self, len: usize) -> Result<Vec<u8>, PalisadeError> {
        let c = self.components().await?;
        if len == 0 {
            return Err(PalisadeError::Crypto(CryptoError::InvalidInput("length")));
        }
        let mut buf = vec![0u8; len];
        c.random.fill(&mut buf)?;
        Ok(buf)
    }

    /// Uniform random integer in `[min, max]`, both ends included.
    pub async fn generate_random_number(&self, min: u64, max: u64) -> Result<u64, PalisadeError> {
        let c = self.components().await?;
        if min > max {
            return Err(PalisadeError::Crypto(CryptoError::InvalidInput("range")));
        }
        let span = max - min;
        if span == u64::MAX {
            return Ok(next_u64(c.random.as_ref())?);
        }
        let size = span + 1;
        // 2^64 mod size; draws in the final partial bucket are rejected so
        // the modulo stays uniform.
        let rem = (u64::MAX % size + 1) % size;
        loop {
            let v = next_u64(c.random.as_ref())?;
            if rem == 0 || v < u64::MAX - rem + 1 {
                return Ok(min + v % size);
            }
        }
    }

    /// SHA3-256 digest of `data`.
    pub async fn compute_hash(&self, data: &[u8]) -> Result<[u8; 32], PalisadeError> {
        let _gate = self.components().await?;
        Ok(Sha3_256::digest(data).into())
    }

    /// Constant-time check of `expected` against the SHA3-256 of `data`.
    /// A digest of the wrong length is `false`, not an error.
    pub async fn verify_hash(&self, data: &[u8], expected: &[u8]) -> Result<bool, PalisadeError> {
        let _gate = self.components().await?;
        if expected.len() != 32 {
            return Ok(false);
        }
        let computed: [u8; 32] = Sha3_256::digest(data).into();
        Ok(bool::from(computed.ct_eq(expected)))
    }
}

impl Default for Palisade {
    fn default() -> Self {
        Self::new(PalisadeConfig::default())
    }
}

fn next_u64(random: &dyn RandomSource) -> Result<u64, CryptoError> {
    let mut buf = [0u8; 8];
    random.fill(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}
