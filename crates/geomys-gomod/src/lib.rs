//! Go-side collaborators for geomys.
//!
//! Implementations of the [`geomys_rules`] collaborator traits backed by the
//! real Go ecosystem: the `go` tool for the module graph, a module proxy for
//! archives, the `zip` crate for reading them, and tree-sitter-go for import
//! extraction. Also hosts `go.sum` verification and the `h1:` hash.

pub mod archive;
pub mod cache;
pub mod dirhash;
mod error;
pub mod go_imports;
pub mod go_sum;
pub mod graph_source;
pub mod proxy;

pub use archive::ZipArchiveReader;
pub use cache::CachedFetcher;
pub use dirhash::hash_zip;
pub use error::GoError;
pub use go_imports::GoImportParser;
pub use go_sum::{GoSum, VerifyingFetcher};
pub use graph_source::{go_mod_graph, read_graph_file};
pub use proxy::ProxyFetcher;
