//! Document storage error types.

use thiserror::Error;

/// Document storage failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Upload exceeds the configured size ceiling.
    #[error("document of {size} bytes exceeds the {max} byte limit")]
    FileTooLarge {
        /// Declared upload size.
        size: u64,
        /// Configured ceiling.
        max: u64,
    },

    /// Content type outside the allow-list.
    #[error("content type '{mime_type}' is not accepted for documents")]
    InvalidMimeType {
        /// The rejected content type.
        mime_type: String,
    },

    /// No object under the given storage key.
    #[error("no stored document at key: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// The backing service cannot issue presigned URLs.
    #[error("storage backend does not support presigned URLs")]
    PresignNotSupported,

    /// Backend misconfiguration (credentials, endpoint, root path).
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Operator call failed.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    pub(crate) fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    pub(crate) fn invalid_mime_type(mime_type: impl Into<String>) -> Self {
        Self::InvalidMimeType {
            mime_type: mime_type.into(),
        }
    }

    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            opendal::ErrorKind::Unsupported => Self::PresignNotSupported,
            _ => Self::Operation(err.to_string()),
        }
    }
}
