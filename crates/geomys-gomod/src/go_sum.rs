//! `go.sum` parsing and checksum verification of fetched modules.

use crate::GoError;
use crate::dirhash::hash_zip;
use geomys_rules::{BoxError, ModuleFetcher, ModuleRef};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Module zip hashes from a `go.sum` file.
///
/// Only `path version h1:...` lines are kept; `go.mod` hashes
/// (`path version/go.mod h1:...`) do not cover the zip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoSum {
    hashes: HashMap<(String, String), String>,
}

impl GoSum {
    pub fn parse(text: &str) -> Result<Self, GoError> {
        let mut hashes = HashMap::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            let [path, version, hash] = fields[..] else {
                return Err(GoError::Parse(format!(
                    "go.sum line {}: expected 3 fields, got {}",
                    idx + 1,
                    fields.len()
                )));
            };
            if version.ends_with("/go.mod") {
                continue;
            }
            if !hash.starts_with("h1:") {
                warn!(line = idx + 1, "skipping go.sum entry with unknown hash type");
                continue;
            }
            hashes.insert((path.to_string(), version.to_string()), hash.to_string());
        }
        Ok(Self { hashes })
    }

    /// Load `<root>/go.sum`; a missing file yields an empty set.
    pub fn load(root: &Path) -> Result<Self, GoError> {
        let path = root.join("go.sum");
        match std::fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(GoError::io(path, e)),
        }
    }

    /// Recorded `h1:` hash of `module`'s zip, if any.
    pub fn get(&self, module: &ModuleRef) -> Option<&str> {
        self.hashes
            .get(&(module.path.clone(), module.version.clone()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Check `archive` against the recorded hash. Unrecorded modules pass.
    pub fn verify(&self, module: &ModuleRef, archive: &[u8]) -> Result<(), GoError> {
        let Some(expected) = self.get(module) else {
            debug!(module = %module, "no go.sum entry, skipping verification");
            return Ok(());
        };
        let actual = hash_zip(archive)?;
        if actual != expected {
            return Err(GoError::ChecksumMismatch {
                module: module.key(),
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }
}

/// Wraps a fetcher, verifying every archive against `go.sum`.
pub struct VerifyingFetcher<F> {
    inner: F,
    sums: GoSum,
}

impl<F> VerifyingFetcher<F> {
    pub fn new(inner: F, sums: GoSum) -> Self {
        Self { inner, sums }
    }
}

impl<F: ModuleFetcher> ModuleFetcher for VerifyingFetcher<F> {
    fn fetch(&self, module: &ModuleRef) -> Result<Vec<u8>, BoxError> {
        let data = self.inner.fetch(module)?;
        self.sums.verify(module, &data)?;
        Ok(data)
    }
}
