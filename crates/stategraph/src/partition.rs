//! Grouping nodes by subgraph.

use std::collections::BTreeMap;

use crate::lineage::NodeSet;
use crate::registry::NodeRegistry;

/// Nodes split into the tag group and one group per named subgraph.
#[derive(Debug, Default)]
pub struct Partition {
    tags: NodeSet,
    subgraphs: BTreeMap<String, NodeSet>,
}

impl Partition {
    /// Group every node of `registry`.
    #[must_use]
    pub fn new(registry: &NodeRegistry) -> Self {
        let mut partition = Self::default();
        for (index, node) in registry.iter() {
            match node.subgraph() {
                Some(name) => {
                    partition
                        .subgraphs
                        .entry(name.to_string())
                        .or_default()
                        .insert(index);
                }
                None => {
                    partition.tags.insert(index);
                }
            }
        }
        partition
    }

    /// The ungrouped tag nodes.
    #[must_use]
    pub fn tags(&self) -> &NodeSet {
        &self.tags
    }

    /// Named subgraphs with their members, sorted by name.
    pub fn subgraphs(&self) -> impl Iterator<Item = (&str, &NodeSet)> {
        self.subgraphs
            .iter()
            .map(|(name, members)| (name.as_str(), members))
    }
}
