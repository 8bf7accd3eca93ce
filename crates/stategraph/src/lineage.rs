//! Transitive ancestors and descendants of every node.
//!
//! Closures are computed once, for the whole graph, by collapsing strongly
//! connected components (Kosaraju) and walking the resulting DAG in
//! topological order. Each component's closure is the union of its
//! neighbors and their closures, so every closure is built from already
//! finished ones and nothing is recomputed. No step recurses on the call
//! stack.
//!
//! A node on a cycle reaches itself, so it is a member of its own closure.
//! Such nodes are reported through [`Lineage::cyclic`]; their closures are
//! still complete and usable.

use std::collections::BTreeSet;
use std::fmt;

use petgraph::algo::kosaraju_scc;
use petgraph::graph::NodeIndex;
use tracing::{debug, warn};

use crate::registry::NodeRegistry;

/// Which way to follow edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Follow `up`: states that must run before.
    Ancestors,
    /// Follow `down`: states that run after.
    Descendants,
}

impl Direction {
    /// Both directions, ancestors first.
    pub const ALL: [Self; 2] = [Self::Ancestors, Self::Descendants];

    fn edges(self) -> petgraph::Direction {
        match self {
            Self::Ancestors => petgraph::Direction::Incoming,
            Self::Descendants => petgraph::Direction::Outgoing,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ancestors => write!(f, "ancestors"),
            Self::Descendants => write!(f, "descendants"),
        }
    }
}

/// A set of nodes.
pub type NodeSet = BTreeSet<NodeIndex>;

/// Cached ancestor and descendant closures for every node of a registry.
#[derive(Debug)]
pub struct Lineage {
    /// Component of each node, indexed by `NodeIndex::index()`.
    component: Vec<usize>,
    ancestors: Vec<NodeSet>,
    descendants: Vec<NodeSet>,
    cyclic: NodeSet,
}

impl Lineage {
    /// Compute both closures for every node of `registry`.
    #[must_use]
    pub fn compute(registry: &NodeRegistry) -> Self {
        let graph = registry.graph();
        // Components come out in reverse topological order: everything a
        // component reaches is listed before it.
        let components = kosaraju_scc(graph);

        let mut component = vec![0; graph.node_count()];
        for (id, members) in components.iter().enumerate() {
            for node in members {
                component[node.index()] = id;
            }
        }

        let descendants = close(
            registry,
            &components,
            &component,
            Direction::Descendants,
            0..components.len(),
        );
        let ancestors = close(
            registry,
            &components,
            &component,
            Direction::Ancestors,
            (0..components.len()).rev(),
        );

        let cyclic: NodeSet = registry
            .iter()
            .map(|(index, _)| index)
            .filter(|index| descendants[component[index.index()]].contains(index))
            .collect();
        for &index in &cyclic {
            warn!(node = registry.node(index).id(), "cyclic dependency");
        }

        debug!(
            nodes = graph.node_count(),
            components = components.len(),
            cyclic = cyclic.len(),
            "computed lineage"
        );
        Self {
            component,
            ancestors,
            descendants,
            cyclic,
        }
    }

    /// Closure of `node` in `direction`.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not belong to the registry this lineage was
    /// computed from.
    #[must_use]
    pub fn closure(&self, node: NodeIndex, direction: Direction) -> &NodeSet {
        let component = self.component[node.index()];
        match direction {
            Direction::Ancestors => &self.ancestors[component],
            Direction::Descendants => &self.descendants[component],
        }
    }

    /// All transitive predecessors of `node`.
    #[must_use]
    pub fn ancestors(&self, node: NodeIndex) -> &NodeSet {
        self.closure(node, Direction::Ancestors)
    }

    /// All transitive successors of `node`.
    #[must_use]
    pub fn descendants(&self, node: NodeIndex) -> &NodeSet {
        self.closure(node, Direction::Descendants)
    }

    /// Nodes that are their own ancestor, i.e. lie on a cycle.
    #[must_use]
    pub fn cyclic(&self) -> &NodeSet {
        &self.cyclic
    }

    /// Returns `true` if `node` lies on a cycle.
    #[must_use]
    pub fn is_cyclic(&self, node: NodeIndex) -> bool {
        self.cyclic.contains(&node)
    }
}

/// Closure of each component, visiting components in `order`. `order` must
/// list every component after all components its neighbors (in
/// `direction`) belong to.
fn close(
    registry: &NodeRegistry,
    components: &[Vec<NodeIndex>],
    component: &[usize],
    direction: Direction,
    order: impl Iterator<Item = usize>,
) -> Vec<NodeSet> {
    let graph = registry.graph();
    let mut closures = vec![NodeSet::new(); components.len()];
    for id in order {
        let mut closure = NodeSet::new();
        for &node in &components[id] {
            for next in graph.neighbors_directed(node, direction.edges()) {
                closure.insert(next);
                let next_component = component[next.index()];
                if next_component != id {
                    closure.extend(closures[next_component].iter().copied());
                }
            }
        }
        closures[id] = closure;
    }
    closures
}
