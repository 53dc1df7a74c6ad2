//! Module dependency graph normalization.
//!
//! `go mod graph` prints one edge per line: `from@version to@version`. The
//! main module appears without a version, and the toolchain shows up as
//! pseudo-modules (`go@1.21`, `toolchain@go1.21.5`) that are not real
//! dependencies.

use crate::Error;
use indexmap::IndexMap;
use serde::Serialize;

/// Module paths that name the Go toolchain rather than a fetchable module.
const TOOLCHAIN_MODULES: &[&str] = &["go", "toolchain"];

/// Adjacency mapping from `path@version` to its direct dependency keys.
///
/// Keys and dependency lists keep first-seen order from the graph source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    edges: IndexMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Parse and normalize raw `go mod graph` output.
    pub fn from_go_mod_graph(text: &str) -> Result<Self, Error> {
        Ok(normalize(parse_edges(text)?))
    }

    /// Direct dependencies of `key`; empty for leaf modules.
    pub fn direct_deps(&self, key: &str) -> &[String] {
        self.edges.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate `(module, direct dependencies)` entries in graph order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.edges.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Iterate every dependency target in graph order (duplicates included).
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.edges.values().flatten().map(String::as_str)
    }

    /// Number of modules with outgoing edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Split raw graph output into `(from, to)` pairs.
///
/// Blank lines are skipped. Any other line must hold exactly two tokens.
pub fn parse_edges(text: &str) -> Result<Vec<(String, String)>, Error> {
    let mut edges = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(from), Some(to), None) => edges.push((from.to_string(), to.to_string())),
            _ => {
                return Err(Error::MalformedGraphLine {
                    line: idx + 1,
                    text: line.to_string(),
                });
            }
        }
    }
    Ok(edges)
}

/// Build the adjacency mapping from raw edges.
///
/// Edges touching a toolchain pseudo-node and self-edges are dropped.
/// Duplicate edges are kept; the traversal deduplicates targets.
pub fn normalize<I, A, B>(edges: I) -> DependencyGraph
where
    I: IntoIterator<Item = (A, B)>,
    A: Into<String>,
    B: Into<String>,
{
    let mut graph = DependencyGraph::default();
    for (from, to) in edges {
        let (from, to) = (from.into(), to.into());
        if is_toolchain_node(&from) || is_toolchain_node(&to) || from == to {
            continue;
        }
        graph.edges.entry(from).or_default().push(to);
    }
    graph
}

fn is_toolchain_node(key: &str) -> bool {
    let path = key.split_once('@').map_or(key, |(path, _)| path);
    TOOLCHAIN_MODULES.contains(&path)
}
