//! Error types for stategraph operations.
//!
//! Only problems that make the graph itself unusable are errors. Findings
//! about a well-formed graph (cycles, isolated states, missing common
//! lineage) are [`Diagnostic`](crate::report::Diagnostic)s instead.

use std::io;
use thiserror::Error;

/// The error type for stategraph operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The input file could not be read or parsed.
    #[error(transparent)]
    Input(#[from] stategraph_input::Error),

    /// The analysis dump could not be serialized.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An edge references a node that was never declared.
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// A node was declared in two different subgraphs.
    #[error("Node {node} declared in both {first} and {second}")]
    ConflictingSubgraph {
        /// The node declared twice.
        node: String,
        /// The subgraph it was first assigned to.
        first: String,
        /// The conflicting later assignment.
        second: String,
    },
}

/// A specialized Result type for stategraph operations.
pub type Result<T> = std::result::Result<T, Error>;
