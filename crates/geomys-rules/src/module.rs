//! Versioned module identity.

use crate::Error;
use crate::canonical::canonicalize;
use serde::Serialize;
use std::fmt;

/// A module at a specific version, formatted canonically as `path@version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModuleRef {
    /// Module path (e.g., "golang.org/x/mod")
    pub path: String,
    /// Module version (e.g., "v0.14.0")
    pub version: String,
}

impl ModuleRef {
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
        }
    }

    /// Parse a graph key of the form `path@version`.
    pub fn parse(key: &str) -> Result<Self, Error> {
        match key.rsplit_once('@') {
            Some((path, version)) if !path.is_empty() && !version.is_empty() => {
                Ok(Self::new(path, version))
            }
            _ => Err(Error::InvalidModuleKey(key.to_string())),
        }
    }

    /// The graph key, `path@version`.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Rule-name fragment for this module's path.
    pub fn canonical_name(&self) -> String {
        canonicalize(&self.path)
    }

    /// Prefix shared by every entry of this module's zip (`path@version/`).
    pub fn archive_prefix(&self) -> String {
        format!("{}@{}/", self.path, self.version)
    }

    /// True if `import` names this module's root package or one of its packages.
    pub fn contains_import(&self, import: &str) -> bool {
        self.relative_import(import).is_some()
    }

    /// Module-relative directory of `import`, if the import belongs to this module.
    ///
    /// Returns `Some("")` for the module root package.
    pub fn relative_import<'a>(&self, import: &'a str) -> Option<&'a str> {
        let rest = import.strip_prefix(self.path.as_str())?;
        if rest.is_empty() {
            Some(rest)
        } else {
            rest.strip_prefix('/')
        }
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.path, self.version)
    }
}

/// Escape a module path for use in a module proxy URL.
///
/// Proxies serve case-insensitive file systems, so every uppercase letter is
/// written as `!` followed by its lowercase form.
pub fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// Escape a module version for use in a module proxy URL.
pub fn escape_version(version: &str) -> String {
    escape_path(version)
}
