//! Object storage for project documents, built on Apache OpenDAL.
//!
//! Uploads and downloads never stream through the API: the service hands out
//! presigned URLs and the client talks to the store directly. Providers are
//! S3-compatible stores and the local filesystem (development only).

mod config;
mod error;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::{DocumentMetadata, PresignedUrl, StorageService, UploadRequest};
