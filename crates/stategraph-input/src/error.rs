//! Error types for stategraph-input operations.

use std::io;
use thiserror::Error;

/// The error type for reading graph inputs.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading the input file.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The DOT parser rejected the input.
    #[error("DOT parse error: {0}")]
    Dot(String),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The input parsed but does not have the expected shape.
    #[error("Invalid input format: {0}")]
    InvalidFormat(String),

    /// The input uses a construct the readers do not handle.
    #[error("Unsupported input: {0}")]
    Unsupported(String),
}

/// A specialized Result type for stategraph-input operations.
pub type Result<T> = std::result::Result<T, Error>;
