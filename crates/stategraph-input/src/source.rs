//! The format-independent graph description handed to the analyzer.

use std::path::Path;

use crate::warning::Warning;

/// A node declaration read from the input.
///
/// The same id may be declared more than once (for example once at the top
/// level of a DOT file and again inside a cluster). Consumers merge the
/// declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNode {
    /// Unique node identifier, exactly as it appears in edge statements.
    pub id: String,
    /// Human readable name (the id without surrounding quotes).
    pub name: String,
    /// Normalized subgraph name, `None` for ungrouped tag nodes.
    pub subgraph: Option<String>,
}

impl SourceNode {
    /// Create a node declaration whose display name is derived from its id.
    #[must_use]
    pub fn new(id: impl Into<String>, subgraph: Option<String>) -> Self {
        let id = id.into();
        let name = id.trim_matches('"').to_string();
        Self { id, name, subgraph }
    }
}

/// A directed edge between two node ids.
///
/// `source` must be satisfied before `target`: `source` is a direct
/// ancestor of `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEdge {
    /// Upstream node id.
    pub source: String,
    /// Downstream node id.
    pub target: String,
}

impl SourceEdge {
    /// Create an edge from `source` to `target`.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// A parsed graph: node declarations, edges and any non-fatal warnings
/// raised while reading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphSource {
    /// Node declarations in input order.
    pub nodes: Vec<SourceNode>,
    /// Edges in input order. Duplicates are allowed.
    pub edges: Vec<SourceEdge>,
    /// Problems that did not prevent the graph from being built.
    pub warnings: Vec<Warning>,
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// A Graphviz DOT digraph with one cluster per sls.
    Dot,
    /// A YAML dump of `state.show_lowstate` for a single minion.
    Lowstate,
}

impl InputFormat {
    /// Guess the format from a file extension: `.yaml` and `.yml` are
    /// lowstate dumps, anything else is read as DOT.
    #[must_use]
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Lowstate
            }
            _ => Self::Dot,
        }
    }
}
