//! Building state graphs directly from a Salt lowstate dump.
//!
//! The input is the YAML output of `salt <minion> state.show_lowstate
//! --out yaml`: a mapping with a single minion id whose value is the list of
//! low chunks.
//!
//! ```yaml
//! web01:
//!   - state: pkg
//!     __id__: nginx
//!     __sls__: web.nginx
//!     name: nginx
//!     fun: installed
//!   - state: service
//!     __id__: nginx-service
//!     __sls__: web.nginx
//!     name: nginx
//!     require:
//!       - pkg: nginx
//! ```
//!
//! Every chunk becomes the node `<state>.<__id__>`, grouped under its sls.
//! Chunks from a tag sls (see [`LowstateOptions::tag_sls`]) are left
//! ungrouped. Requisites listed under the configured [`EdgeRule`] keys
//! become edges.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::source::{GraphSource, SourceEdge, SourceNode};
use crate::warning::Warning;

/// One requisite keyword and the direction of the edges it produces.
///
/// A forward rule (`require`, `watch`) on state `s` targeting `t` yields the
/// edge `t -> s`: the target runs first. A reverse rule (`require_in`,
/// `watch_in`) yields `s -> t`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeRule {
    /// Requisite key in the low chunk, e.g. `require`.
    pub key: String,
    /// Whether the requisite is declared on the upstream state.
    #[serde(default)]
    pub reverse: bool,
}

impl EdgeRule {
    /// A rule whose targets run before the declaring state.
    #[must_use]
    pub fn forward(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reverse: false,
        }
    }

    /// A rule whose targets run after the declaring state.
    #[must_use]
    pub fn reverse(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reverse: true,
        }
    }
}

/// How low chunks are turned into nodes and edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LowstateOptions {
    /// Sls names whose states are synchronization tags rather than members
    /// of a subgraph.
    pub tag_sls: BTreeSet<String>,
    /// Requisite keys turned into edges, in evaluation order.
    pub rules: Vec<EdgeRule>,
}

impl Default for LowstateOptions {
    fn default() -> Self {
        Self {
            tag_sls: ["generic.common.tags", "generic.common.fixes.tags"]
                .into_iter()
                .map(String::from)
                .collect(),
            rules: vec![
                EdgeRule::forward("require"),
                EdgeRule::reverse("require_in"),
                EdgeRule::forward("watch"),
                EdgeRule::reverse("watch_in"),
            ],
        }
    }
}

/// Read and convert a lowstate YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not YAML, or does not
/// have the lowstate shape.
pub fn read_lowstate(path: &Path, options: &LowstateOptions) -> Result<GraphSource> {
    let text = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = text.len(), "read lowstate input");
    parse_lowstate(&text, options)
}

/// Convert lowstate YAML text into a [`GraphSource`].
///
/// Unresolvable requisite targets and ambiguous state names are reported as
/// warnings on the returned source.
///
/// # Errors
///
/// Returns [`Error::Yaml`] for malformed YAML and [`Error::InvalidFormat`]
/// when the document is not a single-minion list of low chunks.
pub fn parse_lowstate(input: &str, options: &LowstateOptions) -> Result<GraphSource> {
    let doc: Value = serde_yaml::from_str(input)?;
    let chunks = minion_chunks(&doc)?;
    let records = chunks
        .iter()
        .enumerate()
        .map(|(index, chunk)| LowChunk::from_value(index, chunk))
        .collect::<Result<Vec<_>>>()?;

    let mut source = GraphSource::default();
    let mut declared = HashSet::new();
    let mut by_name: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for chunk in &records {
        let id = chunk.node_id();
        if let Some(name) = &chunk.name {
            by_name
                .entry(format!("{}.{name}", chunk.state))
                .or_default()
                .insert(id.clone());
        }
        if !declared.insert(id.clone()) {
            debug!(node = %id, "state declared multiple times");
            continue;
        }
        let subgraph = (!options.tag_sls.contains(&chunk.sls)).then(|| chunk.sls.clone());
        source.nodes.push(SourceNode::new(id, subgraph));
    }

    let mut aliases = HashMap::new();
    for (name, ids) in by_name {
        if ids.len() == 1 {
            aliases.extend(ids.into_iter().map(|id| (name.clone(), id)));
        } else {
            source.warnings.push(Warning::AmbiguousName {
                name,
                candidates: ids.into_iter().collect(),
            });
        }
    }

    let mut linked = HashSet::new();
    for chunk in &records {
        let id = chunk.node_id();
        if !linked.insert(id.clone()) {
            continue;
        }
        for rule in &options.rules {
            for target in chunk.requisites(&rule.key)? {
                let resolved = if declared.contains(&target) {
                    target
                } else if let Some(alias) = aliases.get(&target) {
                    alias.clone()
                } else {
                    debug!(state = %id, target = %target, "requisite target not found");
                    source.warnings.push(Warning::UnresolvedTarget {
                        state: id.clone(),
                        target,
                    });
                    continue;
                };
                let edge = if rule.reverse {
                    SourceEdge::new(id.clone(), resolved)
                } else {
                    SourceEdge::new(resolved, id.clone())
                };
                source.edges.push(edge);
            }
        }
    }

    debug!(
        nodes = source.nodes.len(),
        edges = source.edges.len(),
        warnings = source.warnings.len(),
        "converted lowstate"
    );
    Ok(source)
}

fn minion_chunks(doc: &Value) -> Result<&[Value]> {
    let Value::Mapping(minions) = doc else {
        return Err(Error::InvalidFormat(
            "expected a mapping of minion id to low chunks".to_string(),
        ));
    };
    let mut entries = minions.iter();
    let (Some((_, chunks)), None) = (entries.next(), entries.next()) else {
        return Err(Error::InvalidFormat(format!(
            "expected exactly one minion, found {}",
            minions.len()
        )));
    };
    match chunks {
        Value::Sequence(chunks) => Ok(chunks.as_slice()),
        _ => Err(Error::InvalidFormat(
            "minion value must be a list of low chunks".to_string(),
        )),
    }
}

/// The fields of one low chunk the graph cares about.
struct LowChunk<'a> {
    state: String,
    id: String,
    sls: String,
    name: Option<String>,
    fields: &'a Mapping,
}

impl<'a> LowChunk<'a> {
    fn from_value(index: usize, value: &'a Value) -> Result<Self> {
        let Value::Mapping(fields) = value else {
            return Err(Error::InvalidFormat(format!(
                "low chunk #{index} is not a mapping"
            )));
        };
        let required = |key: &str| {
            fields.get(key).and_then(scalar).ok_or_else(|| {
                Error::InvalidFormat(format!("low chunk #{index} has no scalar `{key}`"))
            })
        };
        Ok(Self {
            state: required("state")?,
            id: required("__id__")?,
            sls: required("__sls__")?,
            name: fields.get("name").and_then(scalar),
            fields,
        })
    }

    fn node_id(&self) -> String {
        format!("{}.{}", self.state, self.id)
    }

    /// Targets of requisite `key` as `<state>.<name>` references.
    fn requisites(&self, key: &str) -> Result<Vec<String>> {
        let targets = match self.fields.get(key) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Sequence(targets)) => targets,
            Some(_) => {
                return Err(Error::InvalidFormat(format!(
                    "{}: `{key}` must be a list",
                    self.node_id()
                )));
            }
        };
        targets
            .iter()
            .map(|target| {
                let pair = match target {
                    Value::Mapping(map) if map.len() == 1 => map.iter().next(),
                    _ => None,
                };
                pair.and_then(|(state, name)| Some(format!("{}.{}", scalar(state)?, scalar(name)?)))
                    .ok_or_else(|| {
                        Error::InvalidFormat(format!(
                            "{}: `{key}` entries must be single `state: name` pairs",
                            self.node_id()
                        ))
                    })
            })
            .collect()
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
