//! The [`Storage`] handle and its per-bucket view, [`BucketStorage`].
//!
//! `Storage` owns the configuration (canonical root, digest). `BucketStorage` wires the
//! components together: the resolver validates every path, hashed uploads go
//! stage -> hash -> finalize, and direct writes go straight to the resolved key.

use crate::bucket::BucketName;
use crate::builder::StorageBuilder;
use crate::direct;
use crate::error::{StorageError, StorageErrorExt};
use crate::finalize::{self, FinalizeOutcome};
use crate::hasher::{ContentHasher, DigestAlgorithm, Fingerprint};
use crate::key::UploadKey;
use crate::security::{self, Containment, PathResolver};
use crate::staging::{self, StagedFile};
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncRead;

/// The internal shared state of a [`Storage`] instance.
#[derive(Debug)]
pub struct StorageInner {
    pub(crate) resolver: PathResolver,
    pub(crate) hasher: ContentHasher,
}

/// A cheaply cloneable handle to the object store.
///
/// # Example
///
/// ```rust
/// use silo_storage::{FinalizeOutcome, Storage, StorageError};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), StorageError> {
///     # let tmp = tempfile::tempdir().unwrap();
///     # let root = tmp.path().join("data");
///     let storage = Storage::builder().root(&root).connect().await?;
///     let docs = storage.bucket("docs")?;
///
///     let first = docs.upload("a/b/file.txt", None, &mut &b"hello"[..]).await?;
///     assert_eq!(
///         first.key,
///         "a/b/2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824.txt"
///     );
///
///     let again = docs.upload("a/b/other.txt", None, &mut &b"hello"[..]).await?;
///     assert_eq!(again.outcome, FinalizeOutcome::Deduplicated);
///     assert_eq!(again.path, first.path);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Storage {
    pub(crate) inner: Arc<StorageInner>,
}

impl Deref for Storage {
    type Target = StorageInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Storage {
    #[must_use = "The storage engine is not initialized until you call .connect()"]
    pub fn builder() -> StorageBuilder {
        StorageBuilder::new()
    }

    /// Canonical storage root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    #[must_use]
    pub fn digest(&self) -> DigestAlgorithm {
        self.hasher.algorithm()
    }

    #[must_use]
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    #[must_use]
    pub fn hasher(&self) -> &ContentHasher {
        &self.hasher
    }

    /// Returns a view scoped to one bucket. Nothing is created on disk until the first
    /// write.
    ///
    /// # Errors
    /// [`StorageError::InvalidPath`] if the name is not a valid [`BucketName`].
    pub fn bucket<N>(&self, name: N) -> Result<BucketStorage, StorageError>
    where
        N: TryInto<BucketName, Error = StorageError>,
    {
        Ok(BucketStorage { storage: self.clone(), bucket: name.try_into()? })
    }
}

/// Receipt for a persisted object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: BucketName,
    /// Bucket-relative key, `/`-separated.
    pub key: String,
    /// Public path: `/<bucket>/<key>`.
    pub url: String,
    pub size: u64,
    /// Content address; only set for hashed uploads.
    pub fingerprint: Option<Fingerprint>,
    pub path: PathBuf,
    pub outcome: FinalizeOutcome,
}

/// A bucket-scoped view over [`Storage`].
#[derive(Debug, Clone)]
pub struct BucketStorage {
    storage: Storage,
    bucket: BucketName,
}

impl BucketStorage {
    #[must_use]
    pub const fn name(&self) -> &BucketName {
        &self.bucket
    }

    /// Absolute path of `<bucket>/<key>`. Pure path arithmetic.
    ///
    /// # Errors
    /// [`StorageError::InvalidPath`] for empty or escaping keys.
    pub fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        self.storage.resolver.resolve(&self.bucket, [key], Containment::Descendant)
    }

    /// Stages `body` inside `dest_dir` (bucket-relative, empty for the bucket root).
    ///
    /// # Errors
    /// [`StorageError::InvalidPath`] if `dest_dir` escapes the bucket,
    /// [`StorageError::Io`] if the body cannot be written. Nothing is left behind on error.
    pub async fn stage<R>(&self, dest_dir: &str, body: &mut R) -> Result<StagedFile, StorageError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let dir = self.storage.resolver.resolve(&self.bucket, [dest_dir], Containment::AllowRoot)?;
        staging::stage(&dir, body).await
    }

    /// Hashes a staged upload and files it under `<key dir>/<fingerprint><ext>`.
    ///
    /// The leaf of `key` is only used for its extension; `original_name` supplies the
    /// extension when the key has none.
    ///
    /// # Errors
    /// [`StorageError::InvalidPath`] for an escaping key, [`StorageError::Io`] for
    /// filesystem failures. The staged file is removed on every error.
    pub async fn commit(
        &self,
        staged: StagedFile,
        key: &str,
        original_name: Option<&str>,
    ) -> Result<StoredObject, StorageError> {
        let (parsed, extension) = self.upload_target(key, original_name)?;

        let fingerprint = self.storage.hasher.digest(staged.path()).await?;
        let name = format!("{fingerprint}{extension}");
        let final_path = self.storage.resolver.resolve(
            &self.bucket,
            [parsed.directory(), name.as_str()],
            Containment::Descendant,
        )?;

        let size = staged.len();
        let finalized = finalize::finalize(staged, final_path).await?;
        self.receipt(finalized.path, size, Some(fingerprint), finalized.outcome)
    }

    /// Stages `body` into the key's directory and commits it.
    ///
    /// The key is fully validated before any byte touches the disk.
    ///
    /// # Errors
    /// Same as [`BucketStorage::stage`] and [`BucketStorage::commit`].
    pub async fn upload<R>(
        &self,
        key: &str,
        original_name: Option<&str>,
        body: &mut R,
    ) -> Result<StoredObject, StorageError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let (parsed, _) = self.upload_target(key, original_name)?;
        let staged = self.stage(parsed.directory(), body).await?;
        self.commit(staged, key, original_name).await
    }

    /// Writes `body` verbatim to `<bucket>/<key>`, replacing any previous content.
    ///
    /// # Errors
    /// [`StorageError::InvalidPath`] for empty, directory-like or escaping keys,
    /// [`StorageError::Io`] on write failure (the partial file stays in place).
    pub async fn put<R>(&self, key: &str, body: &mut R) -> Result<StoredObject, StorageError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        if key.is_empty() {
            return Err(StorageError::invalid_path("EMPTY", "Key cannot be empty"));
        }
        if key.ends_with('/') {
            return Err(StorageError::invalid_path(key.to_owned(), "Key must name a file"));
        }

        let path = self.resolve(key)?;
        let written = direct::write(&path, body).await?;
        self.receipt(written.path, written.bytes_written, None, FinalizeOutcome::Written)
    }

    /// `true` when a regular file is stored at `key`.
    ///
    /// # Errors
    /// [`StorageError::InvalidPath`] for invalid keys, [`StorageError::Io`] when the
    /// path cannot be inspected.
    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.resolve(key)?;
        match fs::symlink_metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Failed to inspect {}", path.display()).into()),
            }),
        }
    }

    /// Reads a stored object into memory.
    ///
    /// # Errors
    /// [`StorageError::InvalidPath`] for invalid keys, [`StorageError::Io`] when the
    /// object is missing or unreadable.
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(key)?;
        fs::read(&path).await.context(format!("Read failed: {}", path.display()))
    }

    fn upload_target(
        &self,
        key: &str,
        original_name: Option<&str>,
    ) -> Result<(UploadKey, String), StorageError> {
        self.storage.resolver.resolve(&self.bucket, [key], Containment::AllowRoot)?;

        let parsed = UploadKey::parse(key);
        let extension = parsed.extension(original_name);
        security::check_segment(&extension)?;
        Ok((parsed, extension))
    }

    fn receipt(
        &self,
        path: PathBuf,
        size: u64,
        fingerprint: Option<Fingerprint>,
        outcome: FinalizeOutcome,
    ) -> Result<StoredObject, StorageError> {
        let key = self.storage.resolver.relative_key(&self.bucket, &path).ok_or_else(|| {
            StorageError::invalid_path(path.display().to_string(), "Object is outside its bucket")
        })?;
        let url = format!("/{}/{key}", self.bucket);

        Ok(StoredObject { bucket: self.bucket.clone(), key, url, size, fingerprint, path, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn storage() -> (tempfile::TempDir, Storage) {
        let tmp = tempfile::tempdir().expect("tempdir");
        let storage = Storage::builder().root(tmp.path().join("root")).connect().await.expect("connect");
        (tmp, storage)
    }

    #[tokio::test]
    async fn invalid_upload_key_touches_nothing() {
        let (_tmp, storage) = storage().await;
        let docs = storage.bucket("docs").expect("bucket");

        let err = docs.upload("../escape.txt", None, &mut &b"x"[..]).await.expect_err("escape");
        assert!(err.is_client_error());
        assert!(!storage.root().join("docs").exists());
    }

    #[tokio::test]
    async fn leading_slash_keys_are_rejected() {
        let (_tmp, storage) = storage().await;
        let docs = storage.bucket("docs").expect("bucket");
        assert!(docs.upload("/etc/file.txt", None, &mut &b"x"[..]).await.is_err());
        assert!(docs.put("/etc/passwd", &mut &b"x"[..]).await.is_err());
    }

    #[tokio::test]
    async fn put_rejects_empty_and_directory_keys() {
        let (_tmp, storage) = storage().await;
        let docs = storage.bucket("docs").expect("bucket");
        for key in ["", "dir/", ".", "./"] {
            let err = docs.put(key, &mut &b"x"[..]).await.expect_err(key);
            assert!(err.is_client_error(), "{key:?}");
        }
    }

    #[tokio::test]
    async fn receipt_reports_url_and_size() {
        let (_tmp, storage) = storage().await;
        let docs = storage.bucket("docs").expect("bucket");

        let written = docs.put("notes/today.md", &mut &b"# hi"[..]).await.expect("put");
        assert_eq!(written.key, "notes/today.md");
        assert_eq!(written.url, "/docs/notes/today.md");
        assert_eq!(written.size, 4);
        assert_eq!(written.outcome, FinalizeOutcome::Written);
        assert!(written.fingerprint.is_none());
        assert!(docs.exists("notes/today.md").await.expect("exists"));
        assert!(!docs.exists("notes/missing.md").await.expect("exists"));
    }

    #[tokio::test]
    async fn commit_after_staging_at_bucket_root() {
        let (_tmp, storage) = storage().await;
        let docs = storage.bucket("docs").expect("bucket");

        let staged = docs.stage("", &mut &b"late key"[..]).await.expect("stage");
        let stored = docs.commit(staged, "x/y/", Some("scan.pdf")).await.expect("commit");

        assert!(stored.key.starts_with("x/y/"));
        assert!(stored.key.ends_with(".pdf"));
        assert_eq!(stored.outcome, FinalizeOutcome::Stored);
        assert_eq!(docs.read(&stored.key).await.expect("read"), b"late key");
    }
}
