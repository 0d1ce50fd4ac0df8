use std::borrow::Cow;

/// Errors raised by the storage core.
#[silo_derive::silo_error]
pub enum StorageError {
    /// The bucket name or key cannot be mapped into the bucket root.
    #[error("Invalid path{}: {message}", format_context(.context))]
    InvalidPath { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
}

impl StorageError {
    pub(crate) fn invalid_path(
        message: impl Into<Cow<'static, str>>,
        context: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidPath { message: message.into(), context: Some(context.into()) }
    }

    /// `true` when retrying the same request can never succeed.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidPath { .. })
    }
}
