//! Error types for pathwise application operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for pathwise application operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A snapshot file could not be read.
    #[error("Cannot read snapshot {}: {source}", path.display())]
    SnapshotRead {
        /// Path of the snapshot file
        path: PathBuf,
        /// Underlying IO error
        source: io::Error,
    },

    /// A snapshot document could not be decoded.
    #[error(transparent)]
    Snapshot(#[from] pathwise_core::Error),
}

/// A specialized Result type for pathwise operations.
pub type Result<T> = std::result::Result<T, Error>;
