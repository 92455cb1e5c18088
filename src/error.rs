//! Error types for the stereo head tracking library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filter initialization or processing error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Off-axis projection was requested but no display plane is configured
    #[error("Projection error: off-axis projection requested without a display plane")]
    MissingDisplayPlane,

    /// Display plane corners do not span a plane
    #[error("Degenerate display plane: {0}")]
    DegeneratePlane(String),

    /// Observation log could not be parsed
    #[error("Replay parse error on line {line}: {message}")]
    ReplayParse {
        /// 1-based line number in the log
        line: usize,
        /// What was wrong with the line
        message: String,
    },
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
