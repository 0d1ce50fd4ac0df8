use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use silo_domain::models::ErrorBody;
use silo_storage::StorageError;
use std::borrow::Cow;
use std::io;

/// Everything a handler can fail with, mapped onto HTTP statuses in [`IntoResponse`].
#[silo_derive::silo_error]
pub enum ApiError {
    #[error("{source}{}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },

    #[error("Malformed multipart body{}: {source}", format_context(.context))]
    Multipart { source: MultipartError, context: Option<Cow<'static, str>> },

    #[error("Bad request{}: {message}", format_context(.context))]
    BadRequest { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ApiError {
    pub(super) fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest { message: message.into(), context: None }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Storage { source, .. } if source.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Storage { source: StorageError::Io { source, .. }, .. } => {
                body_error_status(source).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            },
            Self::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Multipart { source, .. } => source.status(),
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

/// Request bodies are streamed straight to disk, so a broken or oversized body surfaces as
/// an I/O error from storage. Those are the client's fault.
fn body_error_status(err: &io::Error) -> Option<StatusCode> {
    let inner = err.get_ref()?;
    if let Some(multipart) = inner.downcast_ref::<MultipartError>() {
        return Some(multipart.status());
    }
    inner.is::<axum::Error>().then_some(StatusCode::BAD_REQUEST)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_path_is_a_client_error() {
        let err: ApiError =
            StorageError::InvalidPath { message: "../etc".into(), context: None }.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn filesystem_failure_is_a_server_error() {
        let err: ApiError = StorageError::from(io::Error::from(io::ErrorKind::PermissionDenied)).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn broken_request_body_is_a_client_error() {
        let body = axum::Error::new(io::Error::other("connection reset"));
        let err: ApiError = StorageError::from(io::Error::other(body)).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn bad_request_message_is_kept() {
        let err = ApiError::bad_request("Missing `file` field");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("Missing `file` field"));
    }
}
