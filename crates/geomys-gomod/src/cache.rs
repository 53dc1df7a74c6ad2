//! On-disk module zip cache.
//!
//! Layout mirrors the proxy: `<dir>/modules/<escaped path>/@v/<escaped version>.zip`.
//! A given module version's zip never changes, so entries never expire.

use crate::GoError;
use crate::proxy::{escape_path, escape_version};
use geomys_rules::{BoxError, ModuleFetcher, ModuleRef};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default cache directory: `geomys` under the platform cache dir
/// (`$XDG_CACHE_HOME` or `~/.cache` on Linux).
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("geomys"))
}

/// Wraps a fetcher, serving repeat requests from disk.
pub struct CachedFetcher<F> {
    inner: F,
    dir: PathBuf,
}

impl<F> CachedFetcher<F> {
    pub fn new(inner: F, dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the zip for `module` is stored.
    pub fn entry_path(&self, module: &ModuleRef) -> PathBuf {
        self.dir
            .join("modules")
            .join(escape_path(&module.path))
            .join("@v")
            .join(format!("{}.zip", escape_version(&module.version)))
    }

    fn store(&self, path: &Path, data: &[u8]) -> Result<(), GoError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GoError::io(parent, e))?;
        }
        // Write then rename so concurrent readers never see a partial zip.
        let tmp = path.with_extension(format!("zip.{}.tmp", std::process::id()));
        fs::write(&tmp, data).map_err(|e| GoError::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| GoError::io(path, e))
    }
}

impl<F: ModuleFetcher> ModuleFetcher for CachedFetcher<F> {
    fn fetch(&self, module: &ModuleRef) -> Result<Vec<u8>, BoxError> {
        let path = self.entry_path(module);
        if let Ok(data) = fs::read(&path) {
            debug!(module = %module, "module cache hit");
            return Ok(data);
        }

        let data = self.inner.fetch(module)?;
        if let Err(e) = self.store(&path, &data) {
            warn!(module = %module, error = %e, "failed to cache module");
        }
        Ok(data)
    }
}
