//! Error types for vector quantization compression

use thiserror::Error;

/// Errors that can occur while compressing, decompressing or persisting an image
#[derive(Debug, Error)]
pub enum VqError {
    /// Block size is zero, larger than the grid, or otherwise inconsistent
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Configuration value out of range or unreadable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Centroid requested for a cluster with no members
    #[error("Cannot compute centroid of an empty cluster")]
    EmptyCluster,

    /// A block could not be mapped to a codeword
    #[error("Encoding failed: {0}")]
    EncodingError(String),

    /// Index grid references a code the codebook does not contain
    #[error("Unknown codebook index: {index:?}")]
    UnknownIndex { index: String },

    /// File I/O error, including truncated or malformed streams
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decode/encode failure
    #[cfg(feature = "image")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl VqError {
    /// Create an invalid-dimensions error.
    pub fn dimensions(message: impl Into<String>) -> Self {
        VqError::InvalidDimensions(message.into())
    }

    /// Create an I/O error for a stream that does not follow the file layout.
    pub fn malformed(message: impl Into<String>) -> Self {
        VqError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            message.into(),
        ))
    }

    /// Get error category for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            VqError::InvalidDimensions(_) => "invalid_dimensions",
            VqError::InvalidConfig(_) => "invalid_config",
            VqError::EmptyCluster => "empty_cluster",
            VqError::EncodingError(_) => "encoding_error",
            VqError::UnknownIndex { .. } => "unknown_index",
            VqError::Io(_) => "io_error",
            #[cfg(feature = "image")]
            VqError::Image(_) => "image_error",
        }
    }
}

/// Result type for vector quantization operations
pub type Result<T> = std::result::Result<T, VqError>;
