//! Print the normalized module graph.

use super::load_graph;
use clap::Args;
use geomys_rules::DependencyGraph;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Go module root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Read `go mod graph` output from a file instead of running `go`
    #[arg(long)]
    pub graph_file: Option<PathBuf>,

    /// Print the adjacency mapping as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &GraphArgs) -> anyhow::Result<()> {
    let graph = load_graph(&args.root, args.graph_file.as_deref())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
    } else {
        print!("{}", render_edges(&graph));
    }
    Ok(())
}

/// One `from to` line per edge, in graph order.
fn render_edges(graph: &DependencyGraph) -> String {
    let mut out = String::new();
    for (from, deps) in graph.iter() {
        for to in deps {
            out.push_str(from);
            out.push(' ');
            out.push_str(to);
            out.push('\n');
        }
    }
    out
}
