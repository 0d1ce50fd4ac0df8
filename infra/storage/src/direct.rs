use crate::error::{StorageError, StorageErrorExt};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::debug;

/// Result of a raw write to an explicit key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    pub path: PathBuf,
    pub bytes_written: u64,
}

/// Streams `body` to `path`, replacing whatever was stored there.
///
/// No staging, hashing or dedup: a failure part-way leaves the partial file in place.
pub(crate) async fn write<R>(path: &Path, body: &mut R) -> Result<Written, StorageError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .context(format!("Failed to create directory {}", parent.display()))?;
    }

    let mut file = fs::File::create(path)
        .await
        .context(format!("Failed to open {} for writing", path.display()))?;
    let bytes_written = tokio::io::copy(body, &mut file)
        .await
        .context(format!("Failed to stream into {}", path.display()))?;
    file.flush().await.context("Failed to flush object")?;
    file.sync_all().await.context("Failed to sync object")?;

    debug!(path = %path.display(), bytes = bytes_written, "Object written");
    Ok(Written { path: path.to_path_buf(), bytes_written })
}
