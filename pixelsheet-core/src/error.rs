use std::path::PathBuf;

/// Errors produced by the conversion pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input image {}: {reason}", path.display())]
    InvalidInput { path: PathBuf, reason: String },

    #[error("failed to load image {}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("resampling failed: {0}")]
    Resampling(String),

    #[error("malformed color token {token:?}: {reason}")]
    Format { token: String, reason: &'static str },

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
