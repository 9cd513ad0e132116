//! Error types for pathwise-core.
//!
//! The analysis engine itself is infallible: malformed references, cycles and
//! empty inputs all produce well-defined results. The only failure mode in
//! this crate is decoding a snapshot document.

use thiserror::Error;

/// The error type for pathwise-core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The snapshot document could not be decoded.
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// A specialized Result type for pathwise-core operations.
pub type Result<T> = std::result::Result<T, Error>;
