//! CLI command implementations - one command per file.

pub mod canonicalize;
pub mod generate;
pub mod graph;
pub mod hash;

use anyhow::Context;
use geomys_rules::DependencyGraph;
use std::path::Path;

/// Load and normalize the module graph from a saved file, or by running
/// `go mod graph` in `root`.
pub(crate) fn load_graph(root: &Path, graph_file: Option<&Path>) -> anyhow::Result<DependencyGraph> {
    let text = match graph_file {
        Some(path) => geomys_gomod::read_graph_file(path)?,
        None => geomys_gomod::go_mod_graph(root)
            .with_context(|| format!("failed to read module graph of {}", root.display()))?,
    };
    Ok(DependencyGraph::from_go_mod_graph(&text)?)
}
