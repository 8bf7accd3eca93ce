//! Reading state graphs from Graphviz DOT files.
//!
//! The expected shape is the one produced when rendering a highstate: one
//! `cluster_<sls>` subgraph per sls file holding that file's states, tag
//! states declared at the top level, and all requisites as top-level edges.
//!
//! ```text
//! digraph states {
//!     "pkg.common";
//!     subgraph cluster_web__nginx {
//!         "pkg.nginx";
//!         "service.nginx";
//!     }
//!     "pkg.common" -> "pkg.nginx" -> "service.nginx";
//! }
//! ```
//!
//! Only explicit node statements declare nodes. An edge naming an id that
//! was never declared is kept as-is and rejected later by the registry.
//!
//! Quoted and bare spellings of an id (`"a"` and `a`) name the same node.
//! Unnamed `subgraph { ... }` blocks only group statements and keep the
//! enclosing cluster.

use std::fs;
use std::path::Path;

use dot_structures::{Edge, EdgeTy, Graph, Id, Stmt, Vertex};
use tracing::debug;

use crate::error::{Error, Result};
use crate::source::{GraphSource, SourceEdge, SourceNode};

/// Prefix Graphviz requires on subgraph names for them to be drawn as clusters.
const CLUSTER_PREFIX: &str = "cluster_";

/// Read and parse a DOT file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid DOT, or if
/// it uses a subgraph as an edge endpoint.
pub fn read_dot(path: &Path) -> Result<GraphSource> {
    let text = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = text.len(), "read DOT input");
    parse_dot(&text)
}

/// Parse DOT text into a [`GraphSource`].
///
/// Undirected graphs are accepted; their edges are read left to right.
///
/// # Errors
///
/// Returns [`Error::Dot`] for syntax errors and [`Error::Unsupported`] for
/// edges whose endpoint is a subgraph.
pub fn parse_dot(input: &str) -> Result<GraphSource> {
    let graph = graphviz_rust::parse(input).map_err(Error::Dot)?;
    let stmts = match graph {
        Graph::Graph { stmts, .. } | Graph::DiGraph { stmts, .. } => stmts,
    };

    let mut source = GraphSource::default();
    collect(&stmts, None, &mut source)?;

    debug!(
        nodes = source.nodes.len(),
        edges = source.edges.len(),
        "parsed DOT graph"
    );
    Ok(source)
}

/// Decode a cluster identifier back into the sls name it was generated from.
///
/// Surrounding quotes and the `cluster_` prefix are removed, `__` becomes
/// `.` and `_dash_` becomes `-`.
///
/// ```
/// use stategraph_input::dot::normalize_subgraph_name;
///
/// assert_eq!(normalize_subgraph_name("cluster_web__nginx"), "web.nginx");
/// assert_eq!(normalize_subgraph_name("\"cluster_my_dash_app\""), "my-app");
/// assert_eq!(normalize_subgraph_name("plain"), "plain");
/// ```
#[must_use]
pub fn normalize_subgraph_name(raw: &str) -> String {
    let name = raw.trim_matches('"');
    let name = name.strip_prefix(CLUSTER_PREFIX).unwrap_or(name);
    name.replace("__", ".").replace("_dash_", "-")
}

fn collect(stmts: &[Stmt], subgraph: Option<&str>, out: &mut GraphSource) -> Result<()> {
    for stmt in stmts {
        match stmt {
            Stmt::Node(node) => {
                out.nodes.push(SourceNode::new(
                    id_text(&node.id.0),
                    subgraph.map(str::to_string),
                ));
            }
            Stmt::Subgraph(sub) => {
                // Anonymous blocks only group statements; they keep the
                // enclosing subgraph.
                let name = match &sub.id {
                    Id::Anonymous(_) => None,
                    id => Some(normalize_subgraph_name(&id_text(id))).filter(|n| !n.is_empty()),
                };
                collect(&sub.stmts, name.as_deref().or(subgraph), out)?;
            }
            Stmt::Edge(edge) => push_edges(edge, out)?,
            Stmt::Attribute(_) | Stmt::GAttribute(_) => {}
        }
    }
    Ok(())
}

fn push_edges(edge: &Edge, out: &mut GraphSource) -> Result<()> {
    let vertices: Vec<&Vertex> = match &edge.ty {
        EdgeTy::Pair(from, to) => vec![from, to],
        EdgeTy::Chain(chain) => chain.iter().collect(),
    };

    for pair in vertices.windows(2) {
        out.edges
            .push(SourceEdge::new(vertex_id(pair[0])?, vertex_id(pair[1])?));
    }
    Ok(())
}

fn vertex_id(vertex: &Vertex) -> Result<String> {
    match vertex {
        Vertex::N(node_id) => Ok(id_text(&node_id.0)),
        Vertex::S(sub) => Err(Error::Unsupported(match &sub.id {
            Id::Anonymous(_) => "subgraph used as an edge endpoint".to_string(),
            id => format!("subgraph {} used as an edge endpoint", id_text(id)),
        })),
    }
}

/// The id as written, minus the quotes of a quoted string.
fn id_text(id: &Id) -> String {
    match id {
        Id::Escaped(text) => text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(text)
            .replace("\\\"", "\""),
        Id::Html(text) | Id::Plain(text) | Id::Anonymous(text) => text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn edge_pairs(source: &GraphSource) -> Vec<(&str, &str)> {
        source
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect()
    }

    #[rstest]
    #[case("cluster_base", "base")]
    #[case("cluster_web__nginx__config", "web.nginx.config")]
    #[case("cluster_my_dash_app", "my-app")]
    #[case("\"cluster_quoted\"", "quoted")]
    #[case("not_a_cluster", "not_a_cluster")]
    fn normalizes_cluster_names(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_subgraph_name(raw), expected);
    }

    #[test]
    fn top_level_nodes_are_ungrouped() {
        let source = parse_dot("digraph g { tag1; a; }").unwrap();

        assert_eq!(source.nodes.len(), 2);
        assert!(source.nodes.iter().all(|n| n.subgraph.is_none()));
    }

    #[test]
    fn cluster_members_get_normalized_subgraph() {
        let source = parse_dot(
            r#"digraph g {
                subgraph cluster_web__nginx {
                    "pkg.nginx";
                    "service.nginx";
                }
            }"#,
        )
        .unwrap();

        assert_eq!(source.nodes.len(), 2);
        assert_eq!(source.nodes[0].id, "pkg.nginx");
        assert_eq!(source.nodes[0].name, "pkg.nginx");
        assert_eq!(source.nodes[0].subgraph.as_deref(), Some("web.nginx"));
        assert_eq!(source.nodes[1].subgraph.as_deref(), Some("web.nginx"));
    }

    #[test]
    fn nested_subgraph_takes_innermost_name() {
        let source = parse_dot(
            "digraph g { subgraph cluster_outer { a; subgraph cluster_inner { b; } } }",
        )
        .unwrap();

        let groups: Vec<_> = source
            .nodes
            .iter()
            .map(|n| (n.name.as_str(), n.subgraph.as_deref()))
            .collect();
        assert_eq!(groups, vec![("a", Some("outer")), ("b", Some("inner"))]);
    }

    #[test]
    fn anonymous_block_keeps_enclosing_subgraph() {
        let source = parse_dot("digraph g { subgraph cluster_x { subgraph { a; b; } } }").unwrap();

        assert!(source
            .nodes
            .iter()
            .all(|n| n.subgraph.as_deref() == Some("x")));
    }

    #[test]
    fn chains_expand_to_consecutive_pairs() {
        let source = parse_dot("digraph g { a; b; c; a -> b -> c; }").unwrap();

        assert_eq!(edge_pairs(&source), vec![("a", "b"), ("b", "c")]);
    }

    #[test]
    fn edges_inside_subgraphs_are_collected() {
        let source = parse_dot("digraph g { subgraph cluster_x { a; b; a -> b; } }").unwrap();

        assert_eq!(edge_pairs(&source), vec![("a", "b")]);
    }

    #[test]
    fn edges_do_not_declare_nodes() {
        let source = parse_dot("digraph g { a; a -> ghost; }").unwrap();

        assert_eq!(source.nodes.len(), 1);
        assert_eq!(edge_pairs(&source), vec![("a", "ghost")]);
    }

    #[test]
    fn attributes_are_ignored() {
        let source = parse_dot(
            r##"digraph g {
                node [shape=box];
                rankdir=LR;
                a [color="#ff0000"];
                b;
                a -> b [style=dashed];
            }"##,
        )
        .unwrap();

        assert_eq!(source.nodes.len(), 2);
        assert_eq!(edge_pairs(&source), vec![("a", "b")]);
    }

    #[test]
    fn subgraph_endpoint_is_unsupported() {
        let err = parse_dot("digraph g { a; b; a -> subgraph { b } }").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Unsupported input: subgraph used as an edge endpoint"
        );
    }

    #[test]
    fn quoted_and_bare_ids_name_the_same_node() {
        let source = parse_dot(r#"digraph g { "a"; "b"; a -> b; "a" -> "b"; }"#).unwrap();

        let ids: Vec<_> = source.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(edge_pairs(&source), vec![("a", "b"), ("a", "b")]);
    }

    #[test]
    fn syntax_error_is_reported() {
        let err = parse_dot("digraph g { a -> }").unwrap_err();

        assert!(matches!(err, Error::Dot(_)));
    }

    #[test]
    fn read_dot_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g.dot");
        fs::write(&path, "digraph g { a; b; a -> b; }").unwrap();

        let source = read_dot(&path).unwrap();
        assert_eq!(source.nodes.len(), 2);
        assert_eq!(source.edges.len(), 1);
    }

    #[test]
    fn read_dot_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = read_dot(&dir.path().join("missing.dot")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
