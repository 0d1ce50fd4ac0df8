use crate::disk;
use crate::error::{StorageError, StorageErrorExt};
use crate::staging::StagedFile;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs;
use tracing::info;

/// What happened to an incoming payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinalizeOutcome {
    /// The staged file became a new object.
    Stored,
    /// An identical object already existed; the staged file was discarded.
    Deduplicated,
    /// An explicit key was written directly.
    Written,
}

impl FinalizeOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::Deduplicated => "deduplicated",
            Self::Written => "written",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalized {
    pub path: PathBuf,
    pub outcome: FinalizeOutcome,
}

/// Promotes `staged` to `final_path`, or discards it when the object already exists.
///
/// The promotion uses an exclusive rename, so of two concurrent finalizers for the same
/// address exactly one stores and the other reports [`FinalizeOutcome::Deduplicated`].
/// Either way exactly one file is left at `final_path` and none at the staged path.
///
/// # Errors
/// [`StorageError::Io`] when something other than a regular file occupies `final_path`,
/// or for filesystem failures unrelated to the destination already existing. The staged
/// file is removed in both cases.
pub(crate) async fn finalize(
    staged: StagedFile,
    final_path: PathBuf,
) -> Result<Finalized, StorageError> {
    if occupant(&final_path).await?.is_some() {
        return deduplicated(staged.into_temp_path(), final_path).await;
    }

    if let Some(parent) = final_path.parent() {
        fs::create_dir_all(parent)
            .await
            .context(format!("Failed to create object directory {}", parent.display()))?;
    }

    let temp = staged.into_temp_path();
    let target = final_path.clone();
    let persisted = disk::blocking(move || match temp.persist_noclobber(&target) {
        Ok(()) => Ok(None),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => Ok(Some(err.path)),
        Err(err) => Err(err.error),
    })
    .await
    .context(format!("Failed to promote staged file to {}", final_path.display()))?;

    if let Some(loser) = persisted {
        return deduplicated(loser, final_path).await;
    }

    if let Some(parent) = final_path.parent() {
        disk::sync_dir(parent).await;
    }

    info!(path = %final_path.display(), outcome = FinalizeOutcome::Stored.as_str(), "Object finalized");
    Ok(Finalized { path: final_path, outcome: FinalizeOutcome::Stored })
}

async fn deduplicated(staged: TempPath, final_path: PathBuf) -> Result<Finalized, StorageError> {
    // Re-checked after a lost race: a directory appearing there is not a duplicate.
    let occupant = occupant(&final_path).await;
    discard(staged).await;

    match occupant? {
        Some(Occupant::File) => {
            info!(
                path = %final_path.display(),
                outcome = FinalizeOutcome::Deduplicated.as_str(),
                "Object finalized"
            );
            Ok(Finalized { path: final_path, outcome: FinalizeOutcome::Deduplicated })
        },
        Some(Occupant::Other) | None => Err(StorageError::Io {
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                "object path is occupied by something that is not a regular file",
            ),
            context: Some(final_path.display().to_string().into()),
        }),
    }
}

async fn discard(staged: TempPath) {
    let path = staged.to_path_buf();
    if let Err(err) = disk::blocking(move || staged.close()).await {
        tracing::warn!(path = %path.display(), error = %err, "Failed to remove staged file");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Occupant {
    File,
    Other,
}

async fn occupant(path: &Path) -> Result<Option<Occupant>, StorageError> {
    match fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(Some(Occupant::File)),
        Ok(_) => Ok(Some(Occupant::Other)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(StorageError::Io {
            source: err,
            context: Some(format!("Failed to inspect {}", path.display()).into()),
        }),
    }
}
