//! Content-addressed object storage on a local filesystem.
//!
//! Objects live in buckets (directories under one storage root). A hashed upload is named
//! after the SHA-256 of its content, so identical payloads written to the same bucket and
//! directory with the same extension collapse into a single file. A direct write stores a
//! body under an explicit key instead.
//!
//! # Core Features
//!
//! - **Sandboxed paths**: [`PathResolver`] maps bucket names and keys onto the root
//!   lexically and rejects `..`, absolute segments and NUL bytes. Nothing escapes a bucket.
//! - **Streaming hashing**: [`ContentHasher`] reads files in 64 KiB chunks.
//! - **Crash-safe staging**: uploads land in a randomly named, fsynced staged file first.
//! - **Race-safe dedup**: promotion uses an exclusive rename; losing a race to an identical
//!   upload reports [`FinalizeOutcome::Deduplicated`] instead of an error.
//!
//! # Examples
//!
//! ```rust
//! use silo_storage::{FinalizeOutcome, Storage, StorageError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), StorageError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     # let root = tmp.path().join("data");
//!     let storage = Storage::builder().root(&root).create(true).connect().await?;
//!     let avatars = storage.bucket("avatars")?;
//!
//!     // Hashed: the key only contributes its directory and extension.
//!     let stored = avatars.upload("2024/me.png", None, &mut &b"\x89PNG"[..]).await?;
//!     assert_eq!(stored.outcome, FinalizeOutcome::Stored);
//!     assert!(stored.url.starts_with("/avatars/2024/"));
//!
//!     // Direct: the key is used verbatim and overwritten on every call.
//!     avatars.put("latest.txt", &mut &b"2024"[..]).await?;
//!     assert_eq!(avatars.read("latest.txt").await?, b"2024");
//!     Ok(())
//! }
//! ```

mod bucket;
mod builder;
mod direct;
mod disk;
mod engine;
mod error;
mod finalize;
mod hasher;
mod key;
mod security;
mod staging;

pub use bucket::BucketName;
pub use builder::StorageBuilder;
pub use direct::Written;
pub use engine::{BucketStorage, Storage, StoredObject};
pub use error::{StorageError, StorageErrorExt};
pub use finalize::{FinalizeOutcome, Finalized};
pub use hasher::{ContentHasher, DigestAlgorithm, Fingerprint};
pub use key::UploadKey;
pub use security::{Containment, PathResolver};
pub use staging::StagedFile;
