//! Stategraph - checks for Salt state dependency graphs.
//!
//! Given a highstate dependency graph (as DOT or as a lowstate dump) this
//! crate reports:
//!
//! - every state that lies on a dependency cycle
//! - tag states that nothing requires, or that require nothing
//! - for each sls subgraph, the single state all of its members come after
//!   and the single state they all come before, or why there is none
//!
//! The pipeline is [`NodeRegistry::from_source`], [`Lineage::compute`] and
//! [`Report::build`]; [`cli::Cli`] wires it to the command line.

#![forbid(unsafe_code)]

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod dump;
pub mod error;
pub mod lineage;
pub mod partition;
pub mod registry;
pub mod report;

pub use config::Config;
pub use error::{Error, Result};
pub use lineage::{Direction, Lineage, NodeSet};
pub use registry::{Node, NodeRegistry};
pub use report::{Diagnostic, Report};
