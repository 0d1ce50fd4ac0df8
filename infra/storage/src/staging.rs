use crate::disk;
use crate::error::{StorageError, StorageErrorExt};
use std::path::Path;
use tempfile::TempPath;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::debug;

pub(crate) const STAGE_PREFIX: &str = ".silo-stage-";
const STAGE_RANDOM_LEN: usize = 16;

/// A fully written, fsynced upload that has no content address yet.
///
/// The file is removed when the handle is dropped, unless it was promoted by the
/// finalizer first.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    len: u64,
}

impl StagedFile {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn into_temp_path(self) -> TempPath {
        self.path
    }
}

/// Streams `body` into a fresh, unpredictably named file inside `dir`.
///
/// `dir` and its ancestors are created first. The name is reserved with exclusive-create
/// semantics, so concurrent uploads never share a file. On any failure the partial file
/// is removed before the error is returned.
pub(crate) async fn stage<R>(dir: &Path, body: &mut R) -> Result<StagedFile, StorageError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    fs::create_dir_all(dir)
        .await
        .context(format!("Failed to create staging directory {}", dir.display()))?;

    let target = dir.to_path_buf();
    let (file, path) = disk::blocking(move || reserve(&target))
        .await
        .context(format!("Failed to create staged file in {}", dir.display()))?;

    let mut file = fs::File::from_std(file);
    let len = tokio::io::copy(body, &mut file)
        .await
        .context(format!("Failed to stream into {}", path.display()))?;
    file.flush().await.context("Failed to flush staged file")?;
    file.sync_all().await.context("Failed to sync staged file")?;
    drop(file);

    debug!(path = %path.display(), bytes = len, "Upload staged");
    Ok(StagedFile { path, len })
}

fn reserve(dir: &Path) -> std::io::Result<(std::fs::File, TempPath)> {
    let file = tempfile::Builder::new()
        .prefix(STAGE_PREFIX)
        .rand_bytes(STAGE_RANDOM_LEN)
        .tempfile_in(dir)?;
    Ok(file.into_parts())
}
