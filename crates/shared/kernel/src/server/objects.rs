use super::error::ApiError;
use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use futures_util::TryStreamExt;
use silo_domain::models::ObjectReceipt;
use silo_storage::{FinalizeOutcome, StagedFile, Storage, StoredObject, UploadKey};
use std::io;
use tokio_util::io::StreamReader;
use tracing::info;

const KEY_FIELD: &str = "key";
const FILE_FIELD: &str = "file";

type Created = (StatusCode, Json<ObjectReceipt>);

/// `POST /{bucket}`: content-addressed upload from `multipart/form-data`.
///
/// The `file` field is streamed to disk as it arrives. When `key` came first the upload
/// is staged in the key's directory, otherwise in the bucket root; finalize moves it.
pub(super) async fn upload_handler(
    State(storage): State<Storage>,
    Path(bucket): Path<String>,
    mut multipart: Multipart,
) -> Result<Created, ApiError> {
    let bucket = storage.bucket(bucket)?;

    let mut key: Option<String> = None;
    let mut upload: Option<(StagedFile, Option<String>)> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(KEY_FIELD) => key = Some(field.text().await?),
            Some(FILE_FIELD) if upload.is_none() => {
                let original_name = field.file_name().map(str::to_owned);
                let dest_dir = key.as_deref().map(UploadKey::parse).unwrap_or_default();

                let reader = StreamReader::new(field.map_err(io::Error::other));
                tokio::pin!(reader);
                let staged = bucket.stage(dest_dir.directory(), &mut reader).await?;
                upload = Some((staged, original_name));
            },
            _ => {},
        }
    }

    let Some((staged, original_name)) = upload else {
        return Err(ApiError::bad_request("Missing `file` field"));
    };

    let stored =
        bucket.commit(staged, key.as_deref().unwrap_or_default(), original_name.as_deref()).await?;

    let status = match stored.outcome {
        FinalizeOutcome::Deduplicated => StatusCode::OK,
        FinalizeOutcome::Stored | FinalizeOutcome::Written => StatusCode::CREATED,
    };
    info!(
        bucket = %stored.bucket,
        key = %stored.key,
        size = stored.size,
        outcome = stored.outcome.as_str(),
        "Upload complete"
    );
    Ok((status, Json(receipt(stored))))
}

/// `PUT /{bucket}/{*key}`: raw body written verbatim to the key.
pub(super) async fn put_handler(
    State(storage): State<Storage>,
    Path((bucket, key)): Path<(String, String)>,
    body: Body,
) -> Result<Created, ApiError> {
    let bucket = storage.bucket(bucket)?;

    let reader = StreamReader::new(body.into_data_stream().map_err(io::Error::other));
    tokio::pin!(reader);
    let stored = bucket.put(&key, &mut reader).await?;

    info!(bucket = %stored.bucket, key = %stored.key, size = stored.size, "Direct write complete");
    Ok((StatusCode::OK, Json(receipt(stored))))
}

fn receipt(stored: StoredObject) -> ObjectReceipt {
    let hashed = stored.fingerprint.is_some();
    ObjectReceipt {
        bucket: stored.bucket.to_string(),
        key: stored.key,
        url: stored.url,
        size: stored.size,
        hash: stored.fingerprint.map(|fp| fp.into_string()),
        deduplicated: hashed.then_some(stored.outcome == FinalizeOutcome::Deduplicated),
    }
}
