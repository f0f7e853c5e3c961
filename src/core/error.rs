use std::path::PathBuf;
use thiserror::Error;

/// Centralized error types for the application
///
/// All errors in the application are converted to this enum for consistent error handling.
/// Uses `thiserror` for automatic error conversion and display formatting.
#[derive(Error, Debug)]
pub enum AppError {
    /// Startup configuration errors (missing token, unknown storage mode, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Webhook token mismatch
    #[error("Forbidden")]
    Forbidden,

    /// Storage backend rejected or failed an upload
    #[error("Backend upload error: {0}")]
    BackendUpload(String),

    /// Metadata file exists but cannot be parsed
    #[error("Metadata store at {path:?} is corrupt: {source}")]
    StoreCorrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Metadata file is missing after startup initialization
    #[error("Metadata store not found at {0:?}")]
    StoreNotFound(PathBuf),

    /// Requested file is neither staged locally nor recorded
    #[error("File not found: {0}")]
    NotFound(String),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// HTTP/Fetch errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors outside the metadata store
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
