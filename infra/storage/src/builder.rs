use crate::engine::{Storage, StorageInner};
use crate::error::{StorageError, StorageErrorExt};
use crate::hasher::{ContentHasher, DigestAlgorithm};
use crate::security::PathResolver;
use private::Sealed;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::info;

#[derive(Debug, Clone)]
struct StorageConfig {
    digest: DigestAlgorithm,
    create: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { digest: DigestAlgorithm::Sha256, create: true }
    }
}

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct StorageBuilder<S: Sealed = NoRoot> {
    state: S,
    config: StorageConfig,
}

#[allow(private_bounds)]
impl<S: Sealed> StorageBuilder<S> {
    /// Digest used for content addresses.
    #[must_use = "Sets the digest algorithm for content addresses"]
    pub const fn digest(mut self, digest: DigestAlgorithm) -> Self {
        self.config.digest = digest;
        self
    }

    #[must_use = "Sets whether the storage root should be created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.config.create = enable;
        self
    }

    fn transition<N: Sealed>(self, state: N) -> StorageBuilder<N> {
        StorageBuilder { state, config: self.config }
    }
}

impl StorageBuilder<NoRoot> {
    #[must_use = "Creates a new storage builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the root directory every bucket lives under"]
    pub fn root(self, path: impl Into<PathBuf>) -> StorageBuilder<WithRoot> {
        self.transition(WithRoot(path.into()))
    }
}

impl StorageBuilder<WithRoot> {
    /// Bootstraps the root directory and returns a shareable [`Storage`] handle.
    ///
    /// With `create(true)` (the default) the root and its ancestors are created. The root
    /// is then canonicalized so every resolved path is absolute and symlink-free at the
    /// root level. Stale staged files are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the root is missing and `create` is false, or when
    /// it cannot be created or resolved.
    pub async fn connect(self) -> Result<Storage, StorageError> {
        let root = &self.state.0;

        if self.config.create {
            fs::create_dir_all(root)
                .await
                .context(format!("Failed to bootstrap storage root: {}", root.display()))?;
        }

        let canonical = fs::canonicalize(root)
            .await
            .context(format!("Failed to resolve storage root: {}", root.display()))?;

        if !fs::metadata(&canonical)
            .await
            .context(format!("Failed to inspect storage root: {}", canonical.display()))?
            .is_dir()
        {
            return Err(StorageError::InvalidPath {
                message: canonical.display().to_string().into(),
                context: Some("Storage root is not a directory".into()),
            });
        }

        info!(
            path = %canonical.display(),
            digest = self.config.digest.name(),
            "Storage root ready"
        );

        Ok(Storage {
            inner: Arc::new(StorageInner {
                resolver: PathResolver::new(canonical),
                hasher: ContentHasher::new(self.config.digest),
            }),
        })
    }
}
