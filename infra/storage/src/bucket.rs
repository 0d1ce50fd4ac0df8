use crate::error::StorageError;
use std::fmt;
use std::sync::Arc;

const MAX_BUCKET_LEN: usize = 255;

/// A validated bucket name.
///
/// Non-empty, at most 255 bytes, not `.` or `..`, and limited to ASCII alphanumerics,
/// `-`, `_` and `.`. Case is preserved because the name is part of the public URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketName(Arc<str>);

impl BucketName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for BucketName {
    type Error = StorageError;

    fn try_from(value: &str) -> Result<Self, StorageError> {
        if value.is_empty() {
            return Err(StorageError::invalid_path("EMPTY", "Bucket name cannot be empty"));
        }
        if value.len() > MAX_BUCKET_LEN {
            return Err(StorageError::invalid_path(
                format!("{}...", value.chars().take(16).collect::<String>()),
                "Bucket name is longer than 255 bytes",
            ));
        }
        if value == "." || value == ".." {
            return Err(StorageError::invalid_path(
                value.to_owned(),
                "Bucket name cannot be a relative directory",
            ));
        }
        if !value.bytes().all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.')) {
            return Err(StorageError::invalid_path(
                value.to_owned(),
                "Bucket name contains illegal characters",
            ));
        }

        Ok(Self(Arc::from(value)))
    }
}

impl TryFrom<String> for BucketName {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, StorageError> {
        Self::try_from(value.as_str())
    }
}

impl TryFrom<&String> for BucketName {
    type Error = StorageError;

    fn try_from(value: &String) -> Result<Self, StorageError> {
        Self::try_from(value.as_str())
    }
}

impl AsRef<str> for BucketName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
