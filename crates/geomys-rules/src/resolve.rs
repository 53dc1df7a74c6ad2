//! Mapping import paths to the rules that provide them.

use crate::ModuleRef;
use std::collections::{BTreeMap, BTreeSet};

/// Where an import is provided from, relative to the importing module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// Another sub-library of the same module, by module-relative directory.
    Local(&'a str),
    /// Part of the compilation unit the importer already belongs to.
    Internal,
    /// A direct dependency of the module.
    External(&'a ModuleRef),
    /// Nothing in the module or its direct dependencies provides it.
    Unresolved,
}

/// Resolves imports of one module against its sub-libraries and direct deps.
///
/// Direct dependencies are matched by path-boundary prefix: a dependency
/// `github.com/a/b` provides `github.com/a/b` and `github.com/a/b/...` but
/// not `github.com/a/bc`. When several dependencies match, the one listed
/// first in `direct_deps` wins.
#[derive(Debug)]
pub struct DepResolver<'a> {
    module: &'a ModuleRef,
    sub_dirs: BTreeSet<&'a str>,
    /// Dependency path -> (position in `direct_deps`, dependency).
    by_path: BTreeMap<&'a str, (usize, &'a ModuleRef)>,
}

impl<'a> DepResolver<'a> {
    pub fn new<I>(module: &'a ModuleRef, direct_deps: &'a [ModuleRef], sub_dirs: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut by_path = BTreeMap::new();
        for (idx, dep) in direct_deps.iter().enumerate() {
            by_path.entry(dep.path.as_str()).or_insert((idx, dep));
        }

        Self {
            module,
            sub_dirs: sub_dirs.into_iter().collect(),
            by_path,
        }
    }

    /// Resolve `import` as seen from files in module-relative `from_dir`.
    pub fn resolve(&self, import: &str, from_dir: &str) -> Resolution<'a> {
        if let Some(rel) = self.module.relative_import(import) {
            // A sub-library cannot depend back on the root without a cycle.
            if rel.is_empty() || rel == from_dir {
                return Resolution::Internal;
            }
            if let Some(&dir) = self.sub_dirs.get(rel) {
                // The root library already nests every sub-library as a source.
                return if from_dir.is_empty() {
                    Resolution::Internal
                } else {
                    Resolution::Local(dir)
                };
            }
            // Not a package of this module; may be a nested module such as `/v2`.
        }

        path_prefixes(import)
            .filter_map(|prefix| self.by_path.get(prefix))
            .min_by_key(|(idx, _)| *idx)
            .map_or(Resolution::Unresolved, |&(_, dep)| Resolution::External(dep))
    }
}

/// Every `/`-boundary prefix of `path`, shortest first, ending with `path` itself.
fn path_prefixes(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/')
        .map(move |(idx, _)| &path[..idx])
        .chain(std::iter::once(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> ModuleRef {
        ModuleRef::new("github.com/me/lib", "v1.0.0")
    }

    #[test]
    fn test_path_prefixes() {
        assert_eq!(
            path_prefixes("github.com/a/b").collect::<Vec<_>>(),
            ["github.com", "github.com/a", "github.com/a/b"]
        );
        assert_eq!(path_prefixes("fmt").collect::<Vec<_>>(), ["fmt"]);
    }

    #[test]
    fn test_prefix_match() {
        let module = module();
        let deps = [ModuleRef::new("github.com/a/b", "v1.2.0")];
        let resolver = DepResolver::new(&module, &deps, []);

        assert_eq!(
            resolver.resolve("github.com/a/b/sub", ""),
            Resolution::External(&deps[0])
        );
        assert_eq!(
            resolver.resolve("github.com/a/b", "x"),
            Resolution::External(&deps[0])
        );
        assert_eq!(resolver.resolve("github.com/a/bc", ""), Resolution::Unresolved);
        assert_eq!(resolver.resolve("github.com/z/z", ""), Resolution::Unresolved);
    }

    #[test]
    fn test_first_listed_dependency_wins() {
        let module = module();
        let deps = [
            ModuleRef::new("github.com/a/b/v2", "v2.0.0"),
            ModuleRef::new("github.com/a/b", "v1.0.0"),
        ];
        let resolver = DepResolver::new(&module, &deps, []);
        assert_eq!(
            resolver.resolve("github.com/a/b/v2/x", ""),
            Resolution::External(&deps[0])
        );

        let reversed = [deps[1].clone(), deps[0].clone()];
        let resolver = DepResolver::new(&module, &reversed, []);
        assert_eq!(
            resolver.resolve("github.com/a/b/v2/x", ""),
            Resolution::External(&reversed[0])
        );
    }

    #[test]
    fn test_duplicate_paths_keep_first_version() {
        let module = module();
        let deps = [
            ModuleRef::new("github.com/a/b", "v1.0.0"),
            ModuleRef::new("github.com/a/b", "v1.1.0"),
        ];
        let resolver = DepResolver::new(&module, &deps, []);
        assert_eq!(
            resolver.resolve("github.com/a/b", ""),
            Resolution::External(&deps[0])
        );
    }

    #[test]
    fn test_intra_module_imports() {
        let module = module();
        let resolver = DepResolver::new(&module, &[], ["sub", "other"]);

        assert_eq!(
            resolver.resolve("github.com/me/lib/other", "sub"),
            Resolution::Local("other")
        );
        assert_eq!(resolver.resolve("github.com/me/lib/other", ""), Resolution::Internal);
        assert_eq!(resolver.resolve("github.com/me/lib", "sub"), Resolution::Internal);
        assert_eq!(resolver.resolve("github.com/me/lib/sub", "sub"), Resolution::Internal);
    }

    #[test]
    fn test_nested_module_falls_through_to_deps() {
        let module = module();
        let deps = [ModuleRef::new("github.com/me/lib/v2", "v2.1.0")];
        let resolver = DepResolver::new(&module, &deps, ["sub"]);
        assert_eq!(
            resolver.resolve("github.com/me/lib/v2/pkg", "sub"),
            Resolution::External(&deps[0])
        );
        assert_eq!(
            resolver.resolve("github.com/me/lib/v2", ""),
            Resolution::External(&deps[0])
        );
    }
}
