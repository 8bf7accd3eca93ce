//! YAML dump of the analyzed graph, for inspecting what the checker saw.

use std::collections::BTreeMap;

use petgraph::graph::NodeIndex;
use serde::Serialize;

use crate::error::Result;
use crate::lineage::Lineage;
use crate::registry::NodeRegistry;

/// One node as it appears in the dump. Neighbor lists hold node names,
/// sorted.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct NodeDump {
    /// Display name.
    pub name: String,
    /// Subgraph, omitted for tag nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subgraph: Option<String>,
    /// Direct predecessors.
    pub up: Vec<String>,
    /// Direct successors.
    pub down: Vec<String>,
    /// All transitive predecessors.
    pub ancestors: Vec<String>,
    /// All transitive successors.
    pub descendants: Vec<String>,
    /// Whether the node lies on a cycle.
    pub cyclic: bool,
}

/// Collect the dump of every node, keyed by node id.
#[must_use]
pub fn collect(registry: &NodeRegistry, lineage: &Lineage) -> BTreeMap<String, NodeDump> {
    registry
        .iter()
        .map(|(index, node)| {
            let dump = NodeDump {
                name: node.name().to_string(),
                subgraph: node.subgraph().map(str::to_string),
                up: sorted_names(registry, registry.up(index)),
                down: sorted_names(registry, registry.down(index)),
                ancestors: sorted_names(registry, lineage.ancestors(index).iter().copied()),
                descendants: sorted_names(registry, lineage.descendants(index).iter().copied()),
                cyclic: lineage.is_cyclic(index),
            };
            (node.id().to_string(), dump)
        })
        .collect()
}

fn sorted_names(registry: &NodeRegistry, nodes: impl Iterator<Item = NodeIndex>) -> Vec<String> {
    let mut names: Vec<String> = nodes
        .map(|index| registry.node(index).name().to_string())
        .collect();
    names.sort();
    names
}

/// Render the dump as a YAML document.
///
/// # Errors
///
/// Returns [`Error::Yaml`](crate::Error::Yaml) if serialization fails.
pub fn to_yaml(registry: &NodeRegistry, lineage: &Lineage) -> Result<String> {
    Ok(serde_yaml::to_string(&collect(registry, lineage))?)
}
