//! Common-lineage analysis of a group of nodes.
//!
//! For a subgraph and a direction the analyzer answers "which single state
//! does every member of this subgraph come after (or before)?".
//!
//! # Algorithm
//!
//! 1. Members with an empty closure are *isolated*: they are global sources
//!    (or sinks) and no common answer can exist. Analysis stops there.
//! 2. The common closure is the intersection of all members' closures.
//! 3. [`base_lineage`] reduces a set to its frontier: elements not reachable
//!    from another element. For ancestors these are the latest common
//!    ancestors, for descendants the first common descendants.
//! 4. The frontier of the common closure restricted to tag nodes is
//!    preferred over the unrestricted frontier, since tags are the
//!    deliberate synchronization points of a highstate.

use petgraph::graph::NodeIndex;

use crate::lineage::{Direction, Lineage, NodeSet};

/// Outcome of analyzing one group in one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// These members have no ancestors (or descendants) at all.
    Isolated(Vec<NodeIndex>),
    /// The common lineage frontier made of tag nodes. More than one element
    /// is ambiguous.
    Tag(Vec<NodeIndex>),
    /// No tag qualifies; the frontier of the whole common lineage.
    General(Vec<NodeIndex>),
    /// The members share no lineage at all.
    Missing,
}

/// Intermediate sets computed for one group and direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineageStatus {
    /// Members whose closure is empty.
    pub direct: NodeSet,
    /// Intersection of all members' closures.
    pub common: NodeSet,
    /// Frontier of `common` restricted to tag nodes.
    pub tags: NodeSet,
    /// Frontier of `common`.
    pub general: NodeSet,
}

impl LineageStatus {
    /// Compute the status of `members` in `direction`. `tags` is the set of
    /// all tag nodes of the graph.
    #[must_use]
    pub fn compute(
        lineage: &Lineage,
        members: &NodeSet,
        tags: &NodeSet,
        direction: Direction,
    ) -> Self {
        let direct = members
            .iter()
            .copied()
            .filter(|&member| lineage.closure(member, direction).is_empty())
            .collect();

        let mut closures = members
            .iter()
            .map(|&member| lineage.closure(member, direction));
        let common = match closures.next() {
            Some(first) => closures.fold(first.clone(), |common, closure| {
                common.intersection(closure).copied().collect()
            }),
            None => NodeSet::new(),
        };

        let tagged = common.intersection(tags).copied().collect();
        Self {
            direct,
            tags: base_lineage(lineage, &tagged, direction),
            general: base_lineage(lineage, &common, direction),
            common,
        }
    }

    /// Classify the status, in priority order: isolated members, tag
    /// frontier, general frontier, nothing.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        if !self.direct.is_empty() {
            Verdict::Isolated(self.direct.iter().copied().collect())
        } else if !self.tags.is_empty() {
            Verdict::Tag(self.tags.iter().copied().collect())
        } else if !self.general.is_empty() {
            Verdict::General(self.general.iter().copied().collect())
        } else {
            Verdict::Missing
        }
    }
}

/// Analyze `members` in `direction`.
#[must_use]
pub fn analyze(
    lineage: &Lineage,
    members: &NodeSet,
    tags: &NodeSet,
    direction: Direction,
) -> Verdict {
    LineageStatus::compute(lineage, members, tags, direction).verdict()
}

/// Reduce `set` to the elements that are not in the closure of any element
/// of `set`.
///
/// The result is an antichain: no element reaches another. Nodes on a
/// cycle are in their own closure and therefore never part of the result.
#[must_use]
pub fn base_lineage(lineage: &Lineage, set: &NodeSet, direction: Direction) -> NodeSet {
    let mut frontier = set.clone();
    for &node in set {
        for reached in lineage.closure(node, direction) {
            frontier.remove(reached);
        }
    }
    frontier
}
