//! geomys: Buck2 third-party rules from a Go module graph.

mod commands;
mod config;
mod logging;

use clap::{Parser, Subcommand};
use commands::{
    canonicalize::CanonicalizeArgs, generate::GenerateArgs, graph::GraphArgs, hash::HashArgs,
};
use config::GeomysConfig;

#[derive(Parser, Debug)]
#[command(name = "geomys", version, about)]
struct Cli {
    /// Debug logging for geomys crates
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Disable colored log output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate rules for every module in the graph and merge them into the BUCK file
    Generate(GenerateArgs),
    /// Print the normalized module graph
    Graph(GraphArgs),
    /// Print the go.sum `h1:` hash of a module zip
    Hash(HashArgs),
    /// Print canonical rule-name fragments for module paths
    Canonicalize(CanonicalizeArgs),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Generate(args) => {
            let config = GeomysConfig::load(&args.root)?;
            commands::generate::run(&args, &config)
        }
        Command::Graph(args) => commands::graph::run(&args),
        Command::Hash(args) => commands::hash::run(&args),
        Command::Canonicalize(args) => commands::canonicalize::run(&args),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose, cli.quiet, cli.no_color);

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_flags() {
        let cli = Cli::parse_from([
            "geomys",
            "-v",
            "generate",
            "--graph-file",
            "graph.txt",
            "--jobs",
            "4",
            "--no-cache",
            "--format",
            "json",
        ]);
        assert!(cli.verbose);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.jobs, Some(4));
        assert!(args.no_cache);
        assert!(!args.dry_run);
        assert_eq!(args.format, commands::generate::OutputFormat::Json);
        assert_eq!(args.graph_file.as_deref(), Some(std::path::Path::new("graph.txt")));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["geomys", "-v", "-q", "hash", "x.zip"]).is_err());
    }
}
