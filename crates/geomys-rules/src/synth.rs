//! Rule synthesis for one module.
//!
//! A module becomes:
//! - an `http_archive` named `<canon>@<version>.mod` exposing every retained
//!   source file as a sub-target,
//! - a top-level `go_library` named `<canon>@<version>` compiling the root
//!   files plus every sub-library,
//! - one `go_library` per non-root directory, named
//!   `<canon>_<dir>@<version>` with `/` in `dir` replaced by `_`.

use crate::imports::ImportMap;
use crate::module::{escape_path, escape_version};
use crate::resolve::{DepResolver, Resolution};
use crate::{FileManifest, ModuleRef, RuleKind, RuleSpec};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Default Go module proxy.
pub const DEFAULT_PROXY: &str = "https://proxy.golang.org";

/// Default Buck package holding the generated rules.
pub const DEFAULT_PACKAGE: &str = "//third-party";

const PUBLIC: &str = "PUBLIC";

/// Knobs for the parts of a rule that depend on the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthOptions {
    /// Module proxy base URL used for archive `urls`.
    pub proxy: String,
    /// Buck package that holds the generated rules, e.g. `//third-party`.
    pub third_party_package: String,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            proxy: DEFAULT_PROXY.to_string(),
            third_party_package: DEFAULT_PACKAGE.to_string(),
        }
    }
}

pub fn archive_rule_name(module: &ModuleRef) -> String {
    format!("{}@{}.mod", module.canonical_name(), module.version)
}

pub fn library_rule_name(module: &ModuleRef) -> String {
    format!("{}@{}", module.canonical_name(), module.version)
}

pub fn sub_library_rule_name(module: &ModuleRef, dir: &str) -> String {
    format!(
        "{}_{}@{}",
        module.canonical_name(),
        dir.replace('/', "_"),
        module.version
    )
}

/// Proxy URL of a module's zip.
pub fn archive_url(proxy: &str, module: &ModuleRef) -> String {
    format!(
        "{}/{}/@v/{}.zip",
        proxy.trim_end_matches('/'),
        escape_path(&module.path),
        escape_version(&module.version)
    )
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Produce the archive rule, the top-level library, and all sub-libraries
/// for `module`, in that order.
///
/// `direct_deps` is the module's own outgoing edges from the graph; its order
/// decides which dependency wins when several could provide an import.
pub fn synthesize(
    module: &ModuleRef,
    manifest: &FileManifest,
    direct_deps: &[ModuleRef],
    imports: &ImportMap,
    archive: &[u8],
    options: &SynthOptions,
) -> Vec<RuleSpec> {
    let archive_name = archive_rule_name(module);
    let directories = manifest.directories();
    let resolver = DepResolver::new(module, direct_deps, directories.keys().copied());
    let src_ref = |file: &str| format!(":{archive_name}[{file}]");

    let mut rules = Vec::with_capacity(directories.len() + 2);

    rules.push(
        RuleSpec::new(RuleKind::Archive, archive_name.clone())
            .with_attr("strip_prefix", module.to_string())
            .with_attr("sha256", sha256_hex(archive))
            .with_attr("sub_targets", manifest.files().to_vec())
            .with_attr("urls", vec![archive_url(&options.proxy, module)])
            .with_attr("visibility", vec![PUBLIC.to_string()]),
    );

    let mut sub_libraries = Vec::with_capacity(directories.len());
    for (dir, files) in &directories {
        let srcs = files.iter().map(|&f| src_ref(f)).collect::<Vec<_>>();
        let deps = resolve_deps(&resolver, module, imports.get(dir), dir, options);
        sub_libraries.push(
            RuleSpec::new(RuleKind::Library, sub_library_rule_name(module, dir))
                .with_attr("deps", deps)
                .with_attr("package_name", format!("{}/{}", module.path, dir))
                .with_attr("srcs", srcs)
                .with_attr("visibility", vec![PUBLIC.to_string()]),
        );
    }

    let srcs = manifest
        .root_files()
        .map(src_ref)
        .chain(sub_libraries.iter().map(|lib| format!(":{}", lib.name)))
        .collect::<Vec<_>>();
    let deps = resolve_deps(&resolver, module, Some(imports.root()), "", options);
    rules.push(
        RuleSpec::new(RuleKind::Library, library_rule_name(module))
            .with_attr("deps", deps)
            .with_attr("package_name", module.path.clone())
            .with_attr("srcs", srcs)
            .with_attr("visibility", vec![PUBLIC.to_string()]),
    );

    rules.extend(sub_libraries);
    rules
}

/// Dependency labels for the imports of one directory, sorted and unique.
fn resolve_deps(
    resolver: &DepResolver<'_>,
    module: &ModuleRef,
    imports: Option<&BTreeSet<String>>,
    dir: &str,
    options: &SynthOptions,
) -> Vec<String> {
    let mut deps = BTreeSet::new();
    for import in imports.into_iter().flatten() {
        match resolver.resolve(import, dir) {
            Resolution::Local(target_dir) => {
                deps.insert(format!(":{}", sub_library_rule_name(module, target_dir)));
            }
            Resolution::External(dep) => {
                deps.insert(format!(
                    "{}:{}",
                    options.third_party_package,
                    library_rule_name(dep)
                ));
            }
            Resolution::Internal => {}
            Resolution::Unresolved => {
                debug!(module = %module, dir, import = %import, "no direct dependency provides import");
            }
        }
    }
    deps.into_iter().collect()
}

/// Rules grouped by kind, for summaries.
pub fn count_by_kind(rules: &[RuleSpec]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for rule in rules {
        *counts.entry(rule.kind.as_str()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> ModuleRef {
        ModuleRef::new("github.com/me/lib", "v1.0.0")
    }

    fn run(files: &[&str], deps: &[ModuleRef], imports: &[(&str, &str)]) -> Vec<RuleSpec> {
        let module = module();
        let manifest = FileManifest::new(&module, files);
        let mut map = ImportMap::new();
        for (dir, import) in imports {
            map.insert(dir, import);
        }
        synthesize(&module, &manifest, deps, &map, b"zip", &SynthOptions::default())
    }

    fn find<'a>(rules: &'a [RuleSpec], name: &str) -> &'a RuleSpec {
        rules
            .iter()
            .find(|r| r.name == name)
            .unwrap_or_else(|| panic!("missing rule {name}"))
    }

    #[test]
    fn test_archive_rule() {
        let rules = run(&["a.go", "sub/b.go"], &[], &[]);
        let archive = &rules[0];
        assert_eq!(archive.kind, RuleKind::Archive);
        assert_eq!(archive.name, "com_github_me_lib@v1.0.0.mod");
        assert_eq!(archive.string_attr("strip_prefix"), Some("github.com/me/lib@v1.0.0"));
        assert_eq!(archive.string_attr("sha256"), Some(sha256_hex(b"zip").as_str()));
        assert_eq!(archive.list_attr("sub_targets").unwrap(), ["a.go", "sub/b.go"]);
        assert_eq!(
            archive.list_attr("urls").unwrap(),
            ["https://proxy.golang.org/github.com/me/lib/@v/v1.0.0.zip"]
        );
        assert_eq!(archive.list_attr("visibility").unwrap(), ["PUBLIC"]);
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sub_library_completeness() {
        let rules = run(&["a.go", "sub/b.go", "sub/c.go"], &[], &[]);
        assert_eq!(rules.len(), 3);

        let top = find(&rules, "com_github_me_lib@v1.0.0");
        assert_eq!(
            top.list_attr("srcs").unwrap(),
            [
                ":com_github_me_lib@v1.0.0.mod[a.go]",
                ":com_github_me_lib_sub@v1.0.0",
            ]
        );
        assert_eq!(top.string_attr("package_name"), Some("github.com/me/lib"));

        let sub = find(&rules, "com_github_me_lib_sub@v1.0.0");
        assert_eq!(
            sub.list_attr("srcs").unwrap(),
            [
                ":com_github_me_lib@v1.0.0.mod[sub/b.go]",
                ":com_github_me_lib@v1.0.0.mod[sub/c.go]",
            ]
        );
        assert_eq!(sub.string_attr("package_name"), Some("github.com/me/lib/sub"));
        assert_eq!(sub.list_attr("deps").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_synthesized_module() {
        let deps = [ModuleRef::new("github.com/a/b", "v1.2.0")];
        let rules = run(
            &["a.go", "sub/b.go"],
            &deps,
            &[("", "github.com/a/b"), ("sub", "github.com/a/b/c")],
        );
        insta::assert_json_snapshot!("synthesized_module", rules);
    }

    #[test]
    fn test_emission_order() {
        let rules = run(&["z/z.go", "a.go", "b/x/y.go"], &[], &[]);
        let names: Vec<&str> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "com_github_me_lib@v1.0.0.mod",
                "com_github_me_lib@v1.0.0",
                "com_github_me_lib_b_x@v1.0.0",
                "com_github_me_lib_z@v1.0.0",
            ]
        );
    }

    #[test]
    fn test_dependency_emitted_once() {
        let deps = [ModuleRef::new("github.com/a/b", "v1.2.0")];
        let rules = run(
            &["a.go"],
            &deps,
            &[
                ("", "github.com/a/b"),
                ("", "github.com/a/b/sub"),
                ("", "github.com/z/z"),
            ],
        );
        let top = find(&rules, "com_github_me_lib@v1.0.0");
        assert_eq!(
            top.list_attr("deps").unwrap(),
            ["//third-party:com_github_a_b@v1.2.0"]
        );
    }

    #[test]
    fn test_sub_library_deps_use_own_directory() {
        let deps = [
            ModuleRef::new("github.com/a/b", "v1.2.0"),
            ModuleRef::new("golang.org/x/mod", "v0.14.0"),
        ];
        let rules = run(
            &["a.go", "sub/b.go", "other/c.go"],
            &deps,
            &[
                ("", "github.com/a/b"),
                ("sub", "golang.org/x/mod/semver"),
                ("sub", "github.com/me/lib/other"),
                ("sub", "github.com/me/lib"),
                ("other", "github.com/me/lib/sub"),
            ],
        );

        let top = find(&rules, "com_github_me_lib@v1.0.0");
        assert_eq!(top.list_attr("deps").unwrap(), ["//third-party:com_github_a_b@v1.2.0"]);

        let sub = find(&rules, "com_github_me_lib_sub@v1.0.0");
        assert_eq!(
            sub.list_attr("deps").unwrap(),
            [
                "//third-party:org_golang_x_mod@v0.14.0",
                ":com_github_me_lib_other@v1.0.0",
            ]
        );

        let other = find(&rules, "com_github_me_lib_other@v1.0.0");
        assert_eq!(other.list_attr("deps").unwrap(), [":com_github_me_lib_sub@v1.0.0"]);
    }

    #[test]
    fn test_custom_options() {
        let module = module();
        let manifest = FileManifest::new(&module, ["a.go"]);
        let deps = [ModuleRef::new("github.com/a/b", "v1.2.0")];
        let mut imports = ImportMap::new();
        imports.insert("", "github.com/a/b");
        let options = SynthOptions {
            proxy: "https://goproxy.example.com/".to_string(),
            third_party_package: "//vendor/go".to_string(),
        };

        let rules = synthesize(&module, &manifest, &deps, &imports, b"", &options);
        assert_eq!(
            rules[0].list_attr("urls").unwrap(),
            ["https://goproxy.example.com/github.com/me/lib/@v/v1.0.0.zip"]
        );
        assert_eq!(rules[1].list_attr("deps").unwrap(), ["//vendor/go:com_github_a_b@v1.2.0"]);
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let deps = [
            ModuleRef::new("github.com/a/b", "v1.2.0"),
            ModuleRef::new("golang.org/x/mod", "v0.14.0"),
        ];
        let imports = [
            ("x", "golang.org/x/mod/semver"),
            ("", "github.com/a/b"),
            ("x", "github.com/a/b/c"),
        ];
        let files = ["x/1.go", "a.go", "y/2.go", "x/0.go"];
        assert_eq!(run(&files, &deps, &imports), run(&files, &deps, &imports));
    }

    #[test]
    fn test_escaped_archive_url() {
        let module = ModuleRef::new("github.com/BurntSushi/toml", "v1.3.2");
        assert_eq!(
            archive_url(DEFAULT_PROXY, &module),
            "https://proxy.golang.org/github.com/!burnt!sushi/toml/@v/v1.3.2.zip"
        );
    }

    #[test]
    fn test_count_by_kind() {
        let rules = run(&["a.go", "sub/b.go"], &[], &[]);
        let counts = count_by_kind(&rules);
        assert_eq!(counts["http_archive"], 1);
        assert_eq!(counts["go_library"], 2);
    }
}
