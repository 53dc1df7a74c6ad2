//! Go module graph to Buck2 third-party rule synthesis.
//!
//! Given the output of `go mod graph` and, for each module, its archive
//! contents, this crate decides which rules a `third-party/BUCK` file needs:
//! one `http_archive` per `module@version`, one top-level `go_library` per
//! module, and one sub-library per source directory below the module root.
//!
//! Everything that touches the outside world (running `go`, downloading
//! zips, parsing Go source, writing the BUCK file) is injected through the
//! traits in [`driver`] and [`imports`], so the engine itself does no I/O.
//!
//! # Example
//!
//! ```ignore
//! use geomys_rules::{DependencyGraph, Generator, GeneratorOptions};
//!
//! let graph = DependencyGraph::from_go_mod_graph(&graph_text)?;
//! let generator = Generator::new(fetcher, archives, parser, GeneratorOptions::default());
//! let rules = generator.run(&graph)?;
//! ```

pub mod canonical;
pub mod driver;
mod error;
pub mod graph;
pub mod imports;
pub mod manifest;
pub mod module;
pub mod resolve;
pub mod rule;
pub mod synth;

pub use canonical::canonicalize;
pub use driver::{ArchiveReader, Generator, GeneratorOptions, ModuleArchive, ModuleFetcher};
pub use error::{BoxError, Error};
pub use graph::{DependencyGraph, normalize, parse_edges};
pub use imports::{ImportMap, ImportParser, resolve_imports};
pub use manifest::FileManifest;
pub use module::ModuleRef;
pub use rule::{AttrValue, RuleKind, RuleSpec};
pub use synth::{SynthOptions, synthesize};
