//! Generate third-party rules and merge them into the BUCK file.

use super::load_graph;
use crate::config::GeomysConfig;
use anyhow::Context;
use clap::{Args, ValueEnum};
use geomys_gomod::{
    CachedFetcher, GoImportParser, GoSum, ProxyFetcher, VerifyingFetcher, ZipArchiveReader,
};
use geomys_rules::synth::SynthOptions;
use geomys_rules::{Generator, GeneratorOptions, ModuleFetcher, RuleSpec};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Merged BUCK file
    Buck,
    /// Generated rules as JSON
    Json,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Go module root
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Read `go mod graph` output from a file instead of running `go`
    #[arg(long)]
    pub graph_file: Option<PathBuf>,

    /// BUCK file to merge into (default: third-party/BUCK under the root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Modules processed concurrently
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Do not read or write the module cache
    #[arg(long)]
    pub no_cache: bool,

    /// Skip go.sum verification of downloaded modules
    #[arg(long)]
    pub no_verify: bool,

    /// Print the result instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Buck)]
    pub format: OutputFormat,
}

pub fn run(args: &GenerateArgs, config: &GeomysConfig) -> anyhow::Result<()> {
    let graph = load_graph(&args.root, args.graph_file.as_deref())?;
    let proxy = config.proxy_url();

    let options = GeneratorOptions {
        synth: SynthOptions {
            proxy: proxy.clone(),
            third_party_package: config.package(),
        },
        jobs: args.jobs.unwrap_or_else(|| config.jobs()),
    };
    let fetcher = build_fetcher(args, config, proxy)?;
    let generator = Generator::new(fetcher, ZipArchiveReader, GoImportParser, options);
    let rules = generator.run(&graph)?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rules)?);
            Ok(())
        }
        OutputFormat::Buck => {
            let path = args
                .output
                .clone()
                .unwrap_or_else(|| args.root.join(config.buck_file()));
            write_buck_file(&path, &rules, args.dry_run)
        }
    }
}

/// Proxy downloads, optionally behind the disk cache and go.sum verification.
fn build_fetcher(
    args: &GenerateArgs,
    config: &GeomysConfig,
    proxy: String,
) -> anyhow::Result<Box<dyn ModuleFetcher>> {
    let mut fetcher: Box<dyn ModuleFetcher> = Box::new(ProxyFetcher::new(proxy));

    if !args.no_cache && config.cache_enabled() {
        match config.cache_dir() {
            Some(dir) => {
                info!(dir = %dir.display(), "using module cache");
                fetcher = Box::new(CachedFetcher::new(fetcher, dir));
            }
            None => warn!("no cache directory available, caching disabled"),
        }
    }

    if !args.no_verify && config.verify() {
        let sums = GoSum::load(&args.root).context("failed to read go.sum")?;
        if sums.is_empty() {
            warn!("no go.sum entries found, downloads will not be verified");
        }
        fetcher = Box::new(VerifyingFetcher::new(fetcher, sums));
    }

    Ok(fetcher)
}

fn write_buck_file(path: &Path, rules: &[RuleSpec], dry_run: bool) -> anyhow::Result<()> {
    let existing = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
    };
    let merged = geomys_buck::merge_into_file(&existing, rules)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    if dry_run {
        print!("{merged}");
        return Ok(());
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, merged).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), rules = rules.len(), "wrote build file");
    Ok(())
}
