//! Turning lineage analysis into diagnostic lines.
//!
//! A [`Report`] is an ordered list of [`Diagnostic`]s. The order is fixed
//! and independent of hash iteration:
//!
//! 1. cycles, by node id
//! 2. tag sources, then tag sinks, by name
//! 3. per subgraph, sorted by name: the ancestor verdict, then the
//!    descendant verdict
//!
//! Each diagnostic renders to exactly one output line.

use std::fmt;
use std::io::{self, Write};

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::analyzer::{Verdict, analyze};
use crate::lineage::{Direction, Lineage};
use crate::partition::Partition;
use crate::registry::NodeRegistry;

/// A single finding about the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The node is its own ancestor.
    Cycle {
        /// Name of the node on the cycle.
        node: String,
    },
    /// A tag node with no ancestors.
    TagSource {
        /// Name of the tag.
        tag: String,
    },
    /// A tag node with no descendants.
    TagSink {
        /// Name of the tag.
        tag: String,
    },
    /// A subgraph member with no lineage at all in `direction`.
    Isolated {
        /// Subgraph name.
        subgraph: String,
        /// Direction analyzed.
        direction: Direction,
        /// Name of the isolated member.
        member: String,
    },
    /// More than one tag qualifies as the subgraph's entry (or exit).
    /// Followed by the [`Diagnostic::TagLineage`] listing them.
    AmbiguousTag {
        /// Subgraph name.
        subgraph: String,
        /// Direction analyzed.
        direction: Direction,
    },
    /// The tag nodes every member comes after (or before).
    TagLineage {
        /// Subgraph name.
        subgraph: String,
        /// Direction analyzed.
        direction: Direction,
        /// Tag names, sorted.
        names: Vec<String>,
    },
    /// No tag qualifies; the non-tag nodes every member comes after (or
    /// before).
    AnyLineage {
        /// Subgraph name.
        subgraph: String,
        /// Direction analyzed.
        direction: Direction,
        /// Node names, sorted.
        names: Vec<String>,
    },
    /// The members share no lineage in `direction`.
    NoCommon {
        /// Subgraph name.
        subgraph: String,
        /// Direction analyzed.
        direction: Direction,
    },
}

impl Diagnostic {
    /// Returns `true` for findings that indicate a broken graph, as opposed
    /// to informational lines.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Cycle { .. }
                | Self::Isolated { .. }
                | Self::AmbiguousTag { .. }
                | Self::NoCommon { .. }
        )
    }
}

/// `SOURCE`/`SINK` label used in isolated-member lines.
fn end_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Ancestors => "SOURCE",
        Direction::Descendants => "SINK",
    }
}

/// Relation label used in lineage lines.
fn relation_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Ancestors => "require",
        Direction::Descendants => "required by",
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycle { node } => write!(f, "ERROR: {node} has cyclic dependencies"),
            Self::TagSource { tag } => write!(f, "SOURCE: TAG/{tag}"),
            Self::TagSink { tag } => write!(f, "SINK  : TAG/{tag}"),
            Self::Isolated {
                subgraph,
                direction,
                member,
            } => write!(f, "ERR: {subgraph}: {}: {member}", end_label(*direction)),
            Self::AmbiguousTag {
                subgraph,
                direction,
            } => {
                let end = match direction {
                    Direction::Ancestors => "source",
                    Direction::Descendants => "sink",
                };
                write!(f, "ERR: {subgraph}: multiple tag as {end}?!")
            }
            Self::TagLineage {
                subgraph,
                direction,
                names,
            } => write!(
                f,
                "tag: {subgraph}: {}: {}",
                relation_label(*direction),
                names.join(", ")
            ),
            Self::AnyLineage {
                subgraph,
                direction,
                names,
            } => write!(
                f,
                "any: {subgraph}: {}: {}",
                relation_label(*direction),
                names.join(", ")
            ),
            Self::NoCommon {
                subgraph,
                direction: Direction::Ancestors,
            } => write!(f, "ERR: {subgraph}: no common source"),
            Self::NoCommon {
                subgraph,
                direction: Direction::Descendants,
            } => write!(f, "ERR: {subgraph}: no common required by."),
        }
    }
}

/// All diagnostics for one graph, in output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
}

impl Report {
    /// Analyze every subgraph of `registry` in both directions.
    #[must_use]
    pub fn build(registry: &NodeRegistry, lineage: &Lineage) -> Self {
        let partition = Partition::new(registry);
        let mut diagnostics = Vec::new();

        let mut cyclic: Vec<_> = lineage
            .cyclic()
            .iter()
            .map(|&index| registry.node(index))
            .collect();
        cyclic.sort_by(|a, b| a.id().cmp(b.id()));
        diagnostics.extend(cyclic.into_iter().map(|node| Diagnostic::Cycle {
            node: node.name().to_string(),
        }));

        let tags = partition.tags();
        diagnostics.extend(
            sorted_names(registry, tags.iter().copied().filter(|&t| lineage.ancestors(t).is_empty()))
                .into_iter()
                .map(|tag| Diagnostic::TagSource { tag }),
        );
        diagnostics.extend(
            sorted_names(registry, tags.iter().copied().filter(|&t| lineage.descendants(t).is_empty()))
                .into_iter()
                .map(|tag| Diagnostic::TagSink { tag }),
        );

        for (subgraph, members) in partition.subgraphs() {
            for direction in Direction::ALL {
                let verdict = analyze(lineage, members, tags, direction);
                debug!(subgraph, %direction, ?verdict, "analyzed subgraph");
                push_verdict(&mut diagnostics, registry, subgraph, direction, verdict);
            }
        }

        Self { diagnostics }
    }

    /// The diagnostics in output order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of error-class diagnostics.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Write one line per diagnostic.
    ///
    /// # Errors
    ///
    /// Propagates write errors from `out`.
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        for diagnostic in &self.diagnostics {
            writeln!(out, "{diagnostic}")?;
        }
        Ok(())
    }
}

fn push_verdict(
    diagnostics: &mut Vec<Diagnostic>,
    registry: &NodeRegistry,
    subgraph: &str,
    direction: Direction,
    verdict: Verdict,
) {
    let subgraph = subgraph.to_string();
    match verdict {
        Verdict::Isolated(members) => {
            diagnostics.extend(sorted_names(registry, members).into_iter().map(|member| {
                Diagnostic::Isolated {
                    subgraph: subgraph.clone(),
                    direction,
                    member,
                }
            }));
        }
        Verdict::Tag(tags) => {
            if tags.len() > 1 {
                diagnostics.push(Diagnostic::AmbiguousTag {
                    subgraph: subgraph.clone(),
                    direction,
                });
            }
            diagnostics.push(Diagnostic::TagLineage {
                subgraph,
                direction,
                names: sorted_names(registry, tags),
            });
        }
        Verdict::General(nodes) => diagnostics.push(Diagnostic::AnyLineage {
            subgraph,
            direction,
            names: sorted_names(registry, nodes),
        }),
        Verdict::Missing => diagnostics.push(Diagnostic::NoCommon {
            subgraph,
            direction,
        }),
    }
}

fn sorted_names(
    registry: &NodeRegistry,
    nodes: impl IntoIterator<Item = NodeIndex>,
) -> Vec<String> {
    let mut names: Vec<String> = nodes
        .into_iter()
        .map(|index| registry.node(index).name().to_string())
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Build a report from `(id, subgraph)` nodes and edges.
    fn report(nodes: &[(&str, Option<&str>)], edges: &[(&str, &str)]) -> Vec<String> {
        let mut registry = NodeRegistry::new();
        for (id, subgraph) in nodes {
            registry.register(id, id);
            if let Some(subgraph) = subgraph {
                registry.assign_subgraph(id, subgraph).unwrap();
            }
        }
        for (from, to) in edges {
            registry.add_edge(from, to).unwrap();
        }
        let lineage = Lineage::compute(&registry);
        Report::build(&registry, &lineage)
            .diagnostics()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[rstest]
    #[case(Diagnostic::Cycle { node: "p".into() }, "ERROR: p has cyclic dependencies")]
    #[case(Diagnostic::TagSource { tag: "t".into() }, "SOURCE: TAG/t")]
    #[case(Diagnostic::TagSink { tag: "t".into() }, "SINK  : TAG/t")]
    #[case(
        Diagnostic::Isolated { subgraph: "X".into(), direction: Direction::Ancestors, member: "a".into() },
        "ERR: X: SOURCE: a"
    )]
    #[case(
        Diagnostic::Isolated { subgraph: "X".into(), direction: Direction::Descendants, member: "c".into() },
        "ERR: X: SINK: c"
    )]
    #[case(
        Diagnostic::AmbiguousTag { subgraph: "X".into(), direction: Direction::Ancestors },
        "ERR: X: multiple tag as source?!"
    )]
    #[case(
        Diagnostic::AmbiguousTag { subgraph: "X".into(), direction: Direction::Descendants },
        "ERR: X: multiple tag as sink?!"
    )]
    #[case(
        Diagnostic::TagLineage { subgraph: "X".into(), direction: Direction::Ancestors, names: vec!["t1".into(), "t2".into()] },
        "tag: X: require: t1, t2"
    )]
    #[case(
        Diagnostic::AnyLineage { subgraph: "X".into(), direction: Direction::Descendants, names: vec!["n".into()] },
        "any: X: required by: n"
    )]
    #[case(
        Diagnostic::NoCommon { subgraph: "X".into(), direction: Direction::Ancestors },
        "ERR: X: no common source"
    )]
    #[case(
        Diagnostic::NoCommon { subgraph: "X".into(), direction: Direction::Descendants },
        "ERR: X: no common required by."
    )]
    fn renders_line(#[case] diagnostic: Diagnostic, #[case] expected: &str) {
        assert_eq!(diagnostic.to_string(), expected);
    }

    #[test]
    fn chain_reports_global_source_and_sink() {
        let lines = report(
            &[("a", Some("X")), ("b", Some("X")), ("c", Some("X"))],
            &[("a", "b"), ("b", "c")],
        );

        assert_eq!(lines, vec!["ERR: X: SOURCE: a", "ERR: X: SINK: c"]);
    }

    #[test]
    fn shared_tag_is_required_by_subgraph() {
        let lines = report(
            &[("tag1", None), ("x1", Some("Y")), ("x2", Some("Y")), ("end", None)],
            &[("tag1", "x1"), ("tag1", "x2"), ("x1", "end"), ("x2", "end")],
        );

        assert_eq!(
            lines,
            vec![
                "SOURCE: TAG/tag1",
                "SINK  : TAG/end",
                "tag: Y: require: tag1",
                "tag: Y: required by: end",
            ]
        );
    }

    #[test]
    fn cycle_is_reported_and_analysis_continues() {
        let lines = report(
            &[("p", Some("Z")), ("q", Some("Z"))],
            &[("p", "q"), ("q", "p")],
        );

        assert_eq!(
            lines,
            vec![
                "ERROR: p has cyclic dependencies",
                "ERROR: q has cyclic dependencies",
                "ERR: Z: no common source",
                "ERR: Z: no common required by.",
            ]
        );
    }

    #[test]
    fn unrelated_members_have_no_common_source() {
        let lines = report(
            &[
                ("r1", Some("roots")),
                ("r2", Some("roots")),
                ("x1", Some("D")),
                ("x2", Some("D")),
                ("sink", Some("sinks")),
            ],
            &[("r1", "x1"), ("r2", "x2"), ("x1", "sink"), ("x2", "sink")],
        );

        assert!(lines.contains(&"ERR: D: no common source".to_string()));
        assert!(lines.contains(&"any: D: required by: sink".to_string()));
    }

    #[test]
    fn ambiguous_tags_precede_the_tag_line() {
        let lines = report(
            &[("t2", None), ("t1", None), ("x1", Some("W")), ("x2", Some("W"))],
            &[("t1", "x1"), ("t1", "x2"), ("t2", "x1"), ("t2", "x2")],
        );

        let w: Vec<_> = lines.iter().filter(|l| l.contains(" W: ")).collect();
        assert_eq!(
            w,
            vec![
                "ERR: W: multiple tag as source?!",
                "tag: W: require: t1, t2",
                "ERR: W: SINK: x1",
                "ERR: W: SINK: x2",
            ]
        );
    }

    #[test]
    fn tag_frontier_suppresses_any_line() {
        let lines = report(
            &[("tag", None), ("mid", Some("M")), ("x1", Some("S")), ("x2", Some("S"))],
            &[("tag", "mid"), ("mid", "x1"), ("mid", "x2")],
        );

        assert!(lines.contains(&"tag: S: require: tag".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("any: S: require:")));
    }

    #[test]
    fn subgraphs_are_reported_in_name_order() {
        let lines = report(&[("b", Some("beta")), ("a", Some("alpha"))], &[]);

        assert_eq!(
            lines,
            vec![
                "ERR: alpha: SOURCE: a",
                "ERR: alpha: SINK: a",
                "ERR: beta: SOURCE: b",
                "ERR: beta: SINK: b",
            ]
        );
    }

    #[test]
    fn error_count_ignores_informational_lines() {
        let report = Report {
            diagnostics: vec![
                Diagnostic::TagSource { tag: "t".into() },
                Diagnostic::Cycle { node: "p".into() },
                Diagnostic::TagLineage {
                    subgraph: "X".into(),
                    direction: Direction::Ancestors,
                    names: vec!["t".into()],
                },
            ],
        };

        assert_eq!(report.error_count(), 1);
        assert!(report.has_errors());
        assert!(!Report::default().has_errors());
    }

    #[test]
    fn write_to_emits_one_line_per_diagnostic() {
        let report = Report {
            diagnostics: vec![
                Diagnostic::TagSource { tag: "a".into() },
                Diagnostic::TagSink { tag: "b".into() },
            ],
        };
        let mut out = Vec::new();

        report.write_to(&mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "SOURCE: TAG/a\nSINK  : TAG/b\n");
    }
}
