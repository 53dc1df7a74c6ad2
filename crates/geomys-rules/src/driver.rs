//! Whole-graph traversal.
//!
//! Every dependency target in the graph is synthesized exactly once. The
//! set of modules to visit is fixed before any fetching starts, so the
//! per-module work can run on a thread pool while the output keeps the
//! order of a sequential run.

use crate::imports::{ImportParser, resolve_imports};
use crate::synth::{SynthOptions, count_by_kind, synthesize};
use crate::{BoxError, DependencyGraph, Error, FileManifest, ModuleRef, RuleSpec};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Downloads a module's zip archive.
pub trait ModuleFetcher: Send + Sync {
    fn fetch(&self, module: &ModuleRef) -> Result<Vec<u8>, BoxError>;
}

impl<T: ModuleFetcher + ?Sized> ModuleFetcher for &T {
    fn fetch(&self, module: &ModuleRef) -> Result<Vec<u8>, BoxError> {
        (**self).fetch(module)
    }
}

impl<T: ModuleFetcher + ?Sized> ModuleFetcher for Box<T> {
    fn fetch(&self, module: &ModuleRef) -> Result<Vec<u8>, BoxError> {
        (**self).fetch(module)
    }
}

/// An opened module archive.
pub trait ModuleArchive {
    /// Names of all file entries, as stored in the archive.
    fn file_names(&self) -> Vec<String>;

    /// Contents of the entry called `name`.
    fn read(&mut self, name: &str) -> Result<Vec<u8>, BoxError>;
}

/// Opens archive bytes returned by a [`ModuleFetcher`].
pub trait ArchiveReader: Send + Sync {
    fn open<'a>(&self, bytes: &'a [u8]) -> Result<Box<dyn ModuleArchive + 'a>, BoxError>;
}

/// Run-wide generation settings.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub synth: SynthOptions,
    /// Modules processed concurrently; `0` and `1` both mean sequential.
    pub jobs: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            synth: SynthOptions::default(),
            jobs: 1,
        }
    }
}

/// Visited set and visit order of one traversal.
#[derive(Debug, Default)]
struct Traversal {
    visited: HashSet<String>,
    pending: Vec<ModuleRef>,
}

impl Traversal {
    fn visit(&mut self, key: &str) -> Result<(), Error> {
        if self.visited.insert(key.to_string()) {
            self.pending.push(ModuleRef::parse(key)?);
        }
        Ok(())
    }
}

/// Distinct dependency targets of `graph`, in first-seen order.
///
/// Graph keys that never appear as a target (the main module) are not
/// included.
pub fn unique_targets(graph: &DependencyGraph) -> Result<Vec<ModuleRef>, Error> {
    let mut traversal = Traversal::default();
    for target in graph.targets() {
        traversal.visit(target)?;
    }
    Ok(traversal.pending)
}

/// Fail if two generated rules share a name.
///
/// `blocks[i]` holds the rules of `modules[i]`. Libraries are reported by
/// their Go package, other rules by their module.
fn check_unique_names(modules: &[ModuleRef], blocks: &[Vec<RuleSpec>]) -> Result<(), Error> {
    let mut owners: HashMap<&str, String> = HashMap::new();
    for (module, rules) in modules.iter().zip(blocks) {
        for rule in rules {
            let owner = rule
                .string_attr("package_name")
                .map(str::to_string)
                .unwrap_or_else(|| module.key());
            if let Some(first) = owners.get(rule.name.as_str()) {
                return Err(Error::NameCollision {
                    name: rule.name.clone(),
                    first: first.clone(),
                    second: owner,
                });
            }
            owners.insert(&rule.name, owner);
        }
    }
    Ok(())
}

/// Drives fetching, import resolution, and synthesis over a whole graph.
pub struct Generator<F, A, P> {
    fetcher: F,
    archives: A,
    parser: P,
    options: GeneratorOptions,
}

impl<F, A, P> Generator<F, A, P>
where
    F: ModuleFetcher,
    A: ArchiveReader,
    P: ImportParser,
{
    pub fn new(fetcher: F, archives: A, parser: P, options: GeneratorOptions) -> Self {
        Self {
            fetcher,
            archives,
            parser,
            options,
        }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Generate rules for every module reachable in `graph`.
    ///
    /// Fails on the first module that cannot be fetched, read, or parsed.
    pub fn run(&self, graph: &DependencyGraph) -> Result<Vec<RuleSpec>, Error> {
        let modules = unique_targets(graph)?;
        info!(
            modules = modules.len(),
            jobs = self.options.jobs.max(1),
            "generating third-party rules"
        );

        let blocks: Vec<Vec<RuleSpec>> = if self.options.jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.jobs)
                .build()?;
            pool.install(|| {
                modules
                    .par_iter()
                    .map(|module| self.generate_module(graph, module))
                    .collect::<Result<Vec<_>, _>>()
            })?
        } else {
            modules
                .iter()
                .map(|module| self.generate_module(graph, module))
                .collect::<Result<Vec<_>, _>>()?
        };

        check_unique_names(&modules, &blocks)?;
        let rules: Vec<RuleSpec> = blocks.into_iter().flatten().collect();
        for (kind, count) in count_by_kind(&rules) {
            info!(kind, count, "generated rules");
        }
        Ok(rules)
    }

    /// Fetch, resolve, and synthesize a single module.
    pub fn generate_module(
        &self,
        graph: &DependencyGraph,
        module: &ModuleRef,
    ) -> Result<Vec<RuleSpec>, Error> {
        debug!(module = %module, "fetching module");
        let bytes = self.fetcher.fetch(module).map_err(|source| Error::Fetch {
            module: module.key(),
            source,
        })?;

        let mut archive = self.archives.open(&bytes).map_err(|source| Error::Archive {
            module: module.key(),
            source,
        })?;
        let names = archive.file_names();
        let manifest = FileManifest::from_archive_names(module, names.iter().map(String::as_str));

        let imports = resolve_imports(
            &manifest,
            |file| archive.read(&manifest.archive_name(file)),
            &self.parser,
        )?;

        let direct_deps = graph
            .direct_deps(&module.key())
            .iter()
            .map(|key| ModuleRef::parse(key))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            module = %module,
            files = manifest.files().len(),
            deps = direct_deps.len(),
            "synthesizing rules"
        );
        Ok(synthesize(
            module,
            &manifest,
            &direct_deps,
            &imports,
            &bytes,
            &self.options.synth,
        ))
    }
}
