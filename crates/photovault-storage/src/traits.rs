//! Storage errors and the delivery sink seam
//!
//! `StorageError` is what every resolver, writer and delivery operation returns.
//! `DeliverySink` is the one trait the HTTP layer implements so delivery can
//! stream without knowing about axum.

use async_trait::async_trait;
use bytes::Bytes;
use photovault_core::AppError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid upload signature: {0}")]
    InvalidSignature(String),

    #[error("Upload grant expired: {0}")]
    Expired(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => AppError::NotFound("Object not found".to_string()),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::Configuration(msg) => AppError::Configuration(msg),
            StorageError::InvalidSignature(_) => {
                AppError::Forbidden("Invalid upload signature".to_string())
            }
            StorageError::Expired(_) => AppError::Forbidden("Upload URL has expired".to_string()),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Framing sent before any body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryHead {
    pub content_length: u64,
    pub content_type: &'static str,
    pub cache_control: String,
}

/// Returned by a sink whose receiving side is gone.
#[derive(Debug, Error)]
#[error("delivery sink closed")]
pub struct SinkClosed;

/// Destination of a streamed object.
///
/// Implementations must report a closed downstream through `SinkClosed` so the
/// read loop can stop promptly.
#[async_trait]
pub trait DeliverySink: Send {
    /// Emit the framing. Called at most once, before any chunk.
    async fn send_head(&mut self, head: DeliveryHead) -> Result<(), SinkClosed>;

    /// Emit one body chunk.
    async fn send_chunk(&mut self, chunk: Bytes) -> Result<(), SinkClosed>;

    /// Terminate the transfer after the head went out. Partial content has
    /// already been delivered; the connection is dropped, not resumed.
    async fn abort(&mut self, reason: String);
}
