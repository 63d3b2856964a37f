//! Error types for the omics-split library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum OmicsError {
    #[error("No shared samples between inputs ({left} vs {right} samples)")]
    EmptySharedSamples { left: usize, right: usize },

    #[error("Need at least 2 features to select from, found {found}")]
    InsufficientFeatures { found: usize },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid cell at row '{row}', column '{column}': {reason}")]
    InvalidCell {
        row: String,
        column: String,
        reason: String,
    },

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, OmicsError>;
