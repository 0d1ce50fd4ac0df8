use crate::error::{StorageError, StorageErrorExt};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Digest used for content addresses. Fixed per [`Storage`](crate::Storage) handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
}

impl DigestAlgorithm {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }

    /// Length of the lowercase hex fingerprint.
    #[must_use]
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Sha256 => 64,
        }
    }
}

/// Lowercase hex content address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    algorithm: DigestAlgorithm,
    hex: String,
}

impl Fingerprint {
    #[must_use]
    pub const fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.hex
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.hex
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.hex
    }
}

/// Streams files through the configured digest with a bounded buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher {
    algorithm: DigestAlgorithm,
}

impl ContentHasher {
    #[must_use]
    pub const fn new(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm }
    }

    #[must_use]
    pub const fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Fingerprint of the file at `path`, read in 64 KiB chunks.
    ///
    /// # Errors
    /// [`StorageError::Io`] when the file cannot be opened or read.
    pub async fn digest(&self, path: &Path) -> Result<Fingerprint, StorageError> {
        let mut file = fs::File::open(path)
            .await
            .context(format!("Failed to open {} for hashing", path.display()))?;

        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        let hex = match self.algorithm {
            DigestAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                loop {
                    let n = file
                        .read(&mut buf)
                        .await
                        .context(format!("Failed to read {} for hashing", path.display()))?;
                    if n == 0 {
                        break;
                    }
                    hasher.update(&buf[..n]);
                }
                hex::encode(hasher.finalize())
            },
        };

        Ok(Fingerprint { algorithm: self.algorithm, hex })
    }

    /// Fingerprint of an in-memory buffer.
    #[must_use]
    pub fn digest_bytes(&self, data: &[u8]) -> Fingerprint {
        let hex = match self.algorithm {
            DigestAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
        };
        Fingerprint { algorithm: self.algorithm, hex }
    }
}
