//! Error types for cloudview

use thiserror::Error;

/// Main error type for cloudview operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Viewer is not initialized")]
    Uninitialized,

    #[error("Viewer has been destroyed")]
    Destroyed,

    #[error("Failed to load point cloud: {0}")]
    Load(String),
}

/// Result type alias for cloudview operations
pub type Result<T> = std::result::Result<T, Error>;
