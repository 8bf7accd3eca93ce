//! The node registry: every declared state and its direct requisites.
//!
//! The registry wraps a petgraph [`DiGraph`] plus an id lookup table. It is
//! filled in two phases, nodes first and edges second, and is read-only
//! once [`NodeRegistry::from_source`] returns.
//!
//! # Edge Direction
//!
//! Edges point from the state that runs first to the state that depends on
//! it: `a -> b` means `a` is in `up(b)` and `b` is in `down(a)`.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use stategraph_input::GraphSource;
use tracing::debug;

use crate::error::{Error, Result};

/// A single state in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: String,
    name: String,
    subgraph: Option<String>,
}

impl Node {
    /// Unique id, as used in edge declarations.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subgraph (sls) the node belongs to, `None` for tag nodes.
    #[must_use]
    pub fn subgraph(&self) -> Option<&str> {
        self.subgraph.as_deref()
    }
}

/// All nodes of the graph with their direct neighbors.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    graph: DiGraph<Node, ()>,
    index: HashMap<String, NodeIndex>,
}

impl NodeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a parsed graph: all node declarations first,
    /// then all edges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConflictingSubgraph`] if a node is declared in two
    /// subgraphs and [`Error::UnknownNode`] if an edge references an id
    /// that no declaration introduced.
    pub fn from_source(source: &GraphSource) -> Result<Self> {
        let mut registry = Self::new();
        for node in &source.nodes {
            registry.register(&node.id, &node.name);
            if let Some(subgraph) = &node.subgraph {
                registry.assign_subgraph(&node.id, subgraph)?;
            }
        }
        for edge in &source.edges {
            registry.add_edge(&edge.source, &edge.target)?;
        }

        debug!(
            nodes = registry.graph.node_count(),
            edges = registry.graph.edge_count(),
            "built node registry"
        );
        Ok(registry)
    }

    /// Register a node, returning its index.
    ///
    /// Registering an existing id is a no-op; the first registration keeps
    /// its display name.
    pub fn register(&mut self, id: &str, name: &str) -> NodeIndex {
        if let Some(&index) = self.index.get(id) {
            return index;
        }
        let index = self.graph.add_node(Node {
            id: id.to_string(),
            name: name.to_string(),
            subgraph: None,
        });
        self.index.insert(id.to_string(), index);
        index
    }

    /// Place a registered node in a subgraph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] for an unregistered id and
    /// [`Error::ConflictingSubgraph`] if the node already belongs to a
    /// different subgraph.
    pub fn assign_subgraph(&mut self, id: &str, subgraph: &str) -> Result<()> {
        let index = self.lookup(id)?;
        let node = &mut self.graph[index];
        if let Some(current) = &node.subgraph {
            if current != subgraph {
                return Err(Error::ConflictingSubgraph {
                    node: node.id.clone(),
                    first: current.clone(),
                    second: subgraph.to_string(),
                });
            }
            return Ok(());
        }
        node.subgraph = Some(subgraph.to_string());
        Ok(())
    }

    /// Add the edge `source -> target`. Repeated edges are stored once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] naming the first endpoint that is not
    /// registered.
    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<()> {
        let from = self.lookup(source)?;
        let to = self.lookup(target)?;
        self.graph.update_edge(from, to, ());
        Ok(())
    }

    /// Index of a registered id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if the id is not registered.
    pub fn lookup(&self, id: &str) -> Result<NodeIndex> {
        self.get(id)
            .ok_or_else(|| Error::UnknownNode(id.to_string()))
    }

    /// Index of a registered id, if any.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// The node at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not come from this registry.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.graph[index]
    }

    /// Number of registered nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` if no node is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All nodes with their indices, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.graph
            .node_indices()
            .map(move |index| (index, &self.graph[index]))
    }

    /// Direct predecessors of `index`.
    pub fn up(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(index, Direction::Incoming)
    }

    /// Direct successors of `index`.
    pub fn down(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(index, Direction::Outgoing)
    }

    pub(crate) fn graph(&self) -> &DiGraph<Node, ()> {
        &self.graph
    }
}
