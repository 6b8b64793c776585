use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to create output directory {path}: {source}")]
    DirectoryCreateError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create staging file in {path}: {source}")]
    TempFileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save resized image to {path}: {reason}")]
    ResizeSaveError { path: PathBuf, reason: String },

    #[error("Codec failed on {path} (code {code}): {message}")]
    CodecFailure {
        path: PathBuf,
        code: i32,
        message: String,
    },

    #[error("Failed to commit {path}: {reason}")]
    CommitError { path: PathBuf, reason: String },

    #[error("Walkdir error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Invalid compression level: {0}. Must be between 0 and 100")]
    InvalidLevel(u8),

    #[error("Invalid quality value: {0}. Must be between 0 and 100")]
    InvalidQuality(u8),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid resize configuration: {0}")]
    InvalidResize(String),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
}

impl CompressionError {
    /// Short, stable name of the error kind, used in batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            CompressionError::Io(_) => "io",
            CompressionError::ImageProcessing(_) => "image",
            CompressionError::UnsupportedFormat(_) => "unsupported-format",
            CompressionError::FileNotFound(_) => "file-not-found",
            CompressionError::DirectoryCreateError { .. } => "directory-create",
            CompressionError::TempFileError { .. } => "temp-file",
            CompressionError::ResizeSaveError { .. } => "resize-save",
            CompressionError::CodecFailure { .. } => "codec",
            CompressionError::CommitError { .. } => "commit",
            CompressionError::Walkdir(_) => "walkdir",
            CompressionError::InvalidLevel(_) => "invalid-level",
            CompressionError::InvalidQuality(_) => "invalid-quality",
            CompressionError::InvalidParameter(_) => "invalid-parameter",
            CompressionError::InvalidResize(_) => "invalid-resize",
            CompressionError::ThreadPool(_) => "thread-pool",
        }
    }
}

pub type Result<T> = std::result::Result<T, CompressionError>;
