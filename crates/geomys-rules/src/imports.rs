//! Per-directory import collection.

use crate::manifest::directory_of;
use crate::{BoxError, Error, FileManifest};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Extracts import paths from one source file.
///
/// Implementations only need to understand the import section; syntax errors
/// further down the file must not fail the parse.
pub trait ImportParser: Send + Sync {
    fn parse_imports(&self, source: &[u8]) -> Result<Vec<String>, BoxError>;
}

/// Third-party import paths seen in each directory of a module.
///
/// Keyed by module-relative directory; `""` is the module root and is
/// always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImportMap {
    dirs: BTreeMap<String, BTreeSet<String>>,
}

impl Default for ImportMap {
    fn default() -> Self {
        let mut dirs = BTreeMap::new();
        dirs.insert(String::new(), BTreeSet::new());
        Self { dirs }
    }
}

impl ImportMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `import` for `dir`. Returns false if it was already present.
    pub fn insert(&mut self, dir: &str, import: &str) -> bool {
        self.dirs
            .entry(dir.to_string())
            .or_default()
            .insert(import.to_string())
    }

    /// Imports of files in the module root.
    pub fn root(&self) -> &BTreeSet<String> {
        // The root entry is created in `Default` and never removed.
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        self.dirs.get("").unwrap_or(&EMPTY)
    }

    /// Imports of files directly in `dir`.
    pub fn get(&self, dir: &str) -> Option<&BTreeSet<String>> {
        self.dirs.get(dir)
    }

    /// Iterate `(directory, imports)` in directory order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.dirs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Whether an import can name a third-party module.
///
/// Standard-library packages have no dot in their first path element
/// (`fmt`, `net/http`); module paths always do (`github.com/...`).
pub fn is_third_party(import: &str) -> bool {
    import
        .split('/')
        .next()
        .is_some_and(|first| first.contains('.'))
}

/// Collect third-party imports for every file of a module, grouped by directory.
///
/// `read_file` receives module-relative paths. Any read or parse failure
/// aborts resolution for the module.
pub fn resolve_imports<R>(
    manifest: &FileManifest,
    mut read_file: R,
    parser: &dyn ImportParser,
) -> Result<ImportMap, Error>
where
    R: FnMut(&str) -> Result<Vec<u8>, BoxError>,
{
    let module = manifest.module();
    let mut map = ImportMap::new();

    for file in manifest.files() {
        let source = read_file(file).map_err(|source| Error::Archive {
            module: module.key(),
            source,
        })?;
        let imports = parser
            .parse_imports(&source)
            .map_err(|source| Error::ImportParse {
                module: module.key(),
                file: file.clone(),
                source,
            })?;

        let dir = directory_of(file);
        for import in imports.iter().filter(|i| is_third_party(i)) {
            map.insert(dir, import);
        }
    }

    Ok(map)
}
