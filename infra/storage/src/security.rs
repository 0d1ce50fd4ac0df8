use crate::bucket::BucketName;
use crate::error::StorageError;
use std::path::{Path, PathBuf};

/// Whether a resolution may land on the bucket root itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// The result must be strictly below the bucket root (objects, keys).
    Descendant,
    /// The bucket root itself is acceptable (bucket and destination directories).
    AllowRoot,
}

/// Maps bucket names and caller-supplied key segments onto the storage root.
///
/// Resolution is lexical: nothing touches the filesystem. Segments are split on `/`;
/// empty and `.` components are dropped, while `..`, NUL bytes, backslashes and
/// absolute-looking segments (leading `/`, drive prefixes such as `C:`) are rejected.
/// The result is always a separator-bounded descendant of `<root>/<bucket>`.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub(crate) const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn bucket_root(&self, bucket: &BucketName) -> PathBuf {
        self.root.join(bucket.as_str())
    }

    /// Resolves `segments` below the bucket root.
    ///
    /// # Errors
    /// [`StorageError::InvalidPath`] for an illegal segment, or when the result is the
    /// bucket root under [`Containment::Descendant`].
    pub fn resolve<I, S>(
        &self,
        bucket: &BucketName,
        segments: I,
        containment: Containment,
    ) -> Result<PathBuf, StorageError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let base = self.bucket_root(bucket);
        let mut candidate = base.clone();

        for segment in segments {
            let segment = segment.as_ref();
            check_segment(segment)?;
            for component in segment.split('/') {
                match component {
                    "" | "." => {},
                    ".." => {
                        return Err(StorageError::invalid_path(
                            segment.to_owned(),
                            "Parent directory components are not allowed",
                        ));
                    },
                    name => candidate.push(name),
                }
            }
        }

        if candidate == base {
            return match containment {
                Containment::AllowRoot => Ok(candidate),
                Containment::Descendant => Err(StorageError::invalid_path(
                    bucket.to_string(),
                    "Key resolves to the bucket root",
                )),
            };
        }

        if is_descendant(&base, &candidate) {
            Ok(candidate)
        } else {
            Err(StorageError::invalid_path(
                candidate.display().to_string(),
                "Path is outside the bucket root",
            ))
        }
    }

    /// Bucket-relative key of `path`, `/`-separated.
    pub(crate) fn relative_key(&self, bucket: &BucketName, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(self.bucket_root(bucket)).ok()?;
        let parts = relative.iter().map(|c| c.to_str()).collect::<Option<Vec<_>>>()?;
        Some(parts.join("/"))
    }
}

/// Rejects a whole segment before it is split into components.
pub(crate) fn check_segment(segment: &str) -> Result<(), StorageError> {
    if segment.contains('\0') {
        return Err(StorageError::invalid_path(
            segment.replace('\0', "\\0"),
            "NUL bytes are not allowed in keys",
        ));
    }
    if segment.contains('\\') {
        return Err(StorageError::invalid_path(
            segment.to_owned(),
            "Backslashes are not allowed in keys",
        ));
    }
    if segment.starts_with('/') || has_drive_prefix(segment) {
        return Err(StorageError::invalid_path(
            segment.to_owned(),
            "Absolute paths are not allowed in keys",
        ));
    }
    Ok(())
}

fn has_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Component-wise containment: `/data/ab` is not an ancestor of `/data/abc`.
fn is_descendant(base: &Path, candidate: &Path) -> bool {
    candidate != base && candidate.starts_with(base)
}
