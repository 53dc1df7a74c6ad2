//! Source files retained from a module archive.

use crate::ModuleRef;
use std::collections::BTreeMap;

/// Non-test Go source files of one module, relative to the module root.
///
/// Test files, `testdata`, example code, commands under `cmd/`, and nested
/// modules (any path containing `@`) are excluded. Files are kept sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileManifest {
    module: ModuleRef,
    files: Vec<String>,
}

impl FileManifest {
    /// Build a manifest from module-relative paths, applying the retention filter.
    pub fn new<I, S>(module: &ModuleRef, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut files: Vec<String> = files
            .into_iter()
            .filter(|f| is_retained(f.as_ref()))
            .map(|f| f.as_ref().to_string())
            .collect();
        files.sort();
        files.dedup();

        Self {
            module: module.clone(),
            files,
        }
    }

    /// Build a manifest from raw zip entry names (`path@version/...`).
    ///
    /// Entries outside the module's own prefix are ignored.
    pub fn from_archive_names<'a, I>(module: &ModuleRef, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let prefix = module.archive_prefix();
        let relative = names
            .into_iter()
            .filter_map(|name| name.strip_prefix(prefix.as_str()));
        Self::new(module, relative)
    }

    pub fn module(&self) -> &ModuleRef {
        &self.module
    }

    /// Retained module-relative file paths, sorted.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Zip entry name for a module-relative file.
    pub fn archive_name(&self, file: &str) -> String {
        format!("{}{}", self.module.archive_prefix(), file)
    }

    /// Files directly in the module root.
    pub fn root_files(&self) -> impl Iterator<Item = &str> {
        self.files
            .iter()
            .map(String::as_str)
            .filter(|f| directory_of(f).is_empty())
    }

    /// Files grouped by their non-root directory, in directory order.
    pub fn directories(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut dirs: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for file in &self.files {
            let dir = directory_of(file);
            if !dir.is_empty() {
                dirs.entry(dir).or_default().push(file);
            }
        }
        dirs
    }
}

/// Directory part of a module-relative path; empty for root-level files.
pub fn directory_of(file: &str) -> &str {
    file.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Whether a module-relative path is a library source file worth compiling.
pub fn is_retained(relative: &str) -> bool {
    if !relative.ends_with(".go") || relative.ends_with("_test.go") {
        return false;
    }
    if relative.contains('@') || relative.contains("example") {
        return false;
    }

    let dir = directory_of(relative);
    if dir.is_empty() {
        return true;
    }
    let mut segments = dir.split('/');
    if segments.clone().next() == Some("cmd") {
        return false;
    }
    // The go tool ignores testdata and directories starting with `.` or `_`.
    !segments.any(|s| s == "testdata" || s.starts_with('.') || s.starts_with('_'))
}
