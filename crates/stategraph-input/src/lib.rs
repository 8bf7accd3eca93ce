//! Readers for Salt state dependency graphs.
//!
//! This library turns the two formats a highstate dependency graph is
//! usually available in into a format-independent [`GraphSource`]:
//!
//! - [`dot`]: a Graphviz DOT rendering with one cluster per sls file
//! - [`lowstate`]: the YAML output of `state.show_lowstate`

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dot;
pub mod error;
pub mod lowstate;
pub mod source;
pub mod warning;

pub use error::{Error, Result};
pub use lowstate::{EdgeRule, LowstateOptions};
pub use source::{GraphSource, InputFormat, SourceEdge, SourceNode};
pub use warning::Warning;

use std::path::Path;

/// Read a graph file in the given format.
///
/// # Errors
///
/// Propagates the errors of [`dot::read_dot`] and
/// [`lowstate::read_lowstate`].
pub fn read_graph(
    path: &Path,
    format: InputFormat,
    options: &LowstateOptions,
) -> Result<GraphSource> {
    match format {
        InputFormat::Dot => dot::read_dot(path),
        InputFormat::Lowstate => lowstate::read_lowstate(path, options),
    }
}
