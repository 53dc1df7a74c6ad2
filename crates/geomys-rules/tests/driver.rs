use geomys_rules::{
    ArchiveReader, BoxError, DependencyGraph, Error, Generator, GeneratorOptions, ImportParser,
    ModuleArchive, ModuleFetcher, ModuleRef, RuleKind, RuleSpec,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Serves archives from memory. An archive is encoded as lines of
/// `name\tcontents` so the fake reader can rebuild it.
#[derive(Default)]
struct MemoryFetcher {
    archives: HashMap<String, Vec<u8>>,
    fetches: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    fn with_module(mut self, key: &str, files: &[(&str, &str)]) -> Self {
        let module = ModuleRef::parse(key).unwrap();
        let mut encoded = String::new();
        for (name, contents) in files {
            encoded.push_str(&format!(
                "{}{}\t{}\n",
                module.archive_prefix(),
                name,
                contents.replace('\n', ";")
            ));
        }
        self.archives.insert(key.to_string(), encoded.into_bytes());
        self
    }
}

impl ModuleFetcher for MemoryFetcher {
    fn fetch(&self, module: &ModuleRef) -> Result<Vec<u8>, BoxError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(module.key());
        self.archives
            .get(&module.key())
            .cloned()
            .ok_or_else(|| format!("404 for {module}").into())
    }
}

struct MapArchive {
    entries: Vec<(String, Vec<u8>)>,
}

impl ModuleArchive for MapArchive {
    fn file_names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read(&mut self, name: &str) -> Result<Vec<u8>, BoxError> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| format!("missing entry {name}").into())
    }
}

struct MapArchiveReader;

impl ArchiveReader for MapArchiveReader {
    fn open<'a>(&self, bytes: &'a [u8]) -> Result<Box<dyn ModuleArchive + 'a>, BoxError> {
        let text = std::str::from_utf8(bytes)?;
        let entries = text
            .lines()
            .filter_map(|line| line.split_once('\t'))
            .map(|(name, body)| (name.to_string(), body.replace(';', "\n").into_bytes()))
            .collect();
        Ok(Box::new(MapArchive { entries }))
    }
}

/// One import per line.
struct LineParser;

impl ImportParser for LineParser {
    fn parse_imports(&self, source: &[u8]) -> Result<Vec<String>, BoxError> {
        let text = std::str::from_utf8(source)?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }
}

const GRAPH: &str = "\
example.com/main github.com/a/b@v1.0.0
example.com/main golang.org/x/text@v0.3.0
example.com/main go@1.21
github.com/a/b@v1.0.0 golang.org/x/text@v0.3.0
github.com/a/b@v1.0.0 toolchain@go1.21.0
";

fn fetcher() -> MemoryFetcher {
    MemoryFetcher::default()
        .with_module(
            "github.com/a/b@v1.0.0",
            &[
                ("b.go", "fmt\ngithub.com/a/b/util"),
                ("util/u.go", "golang.org/x/text/unicode"),
                ("util/u_test.go", "github.com/stretchr/testify"),
                ("cmd/tool/main.go", "github.com/spf13/cobra"),
            ],
        )
        .with_module("golang.org/x/text@v0.3.0", &[("text.go", "unicode/utf8")])
}

fn names(rules: &[RuleSpec]) -> Vec<&str> {
    rules.iter().map(|r| r.name.as_str()).collect()
}

fn find<'a>(rules: &'a [RuleSpec], name: &str) -> &'a RuleSpec {
    rules
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no rule named {name}"))
}

#[test]
fn test_shared_dependency_generated_once() {
    let graph = DependencyGraph::from_go_mod_graph(GRAPH).unwrap();
    let generator = Generator::new(
        fetcher(),
        MapArchiveReader,
        LineParser,
        GeneratorOptions::default(),
    );
    let rules = generator.run(&graph).unwrap();

    // golang.org/x/text is a target of two edges but is generated once.
    assert_eq!(
        names(&rules),
        [
            "com_github_a_b@v1.0.0.mod",
            "com_github_a_b@v1.0.0",
            "com_github_a_b_util@v1.0.0",
            "org_golang_x_text@v0.3.0.mod",
            "org_golang_x_text@v0.3.0",
        ]
    );
}

#[test]
fn test_fetch_count_matches_unique_targets() {
    let graph = DependencyGraph::from_go_mod_graph(GRAPH).unwrap();
    let fetcher = fetcher();
    let generator = Generator::new(
        &fetcher,
        MapArchiveReader,
        LineParser,
        GeneratorOptions {
            jobs: 3,
            ..GeneratorOptions::default()
        },
    );
    generator.run(&graph).unwrap();

    let targets = geomys_rules::driver::unique_targets(&graph).unwrap();
    assert_eq!(targets.len(), 2);
    assert_eq!(fetcher.fetches.load(Ordering::SeqCst), 2);

    let mut seen = fetcher.seen.lock().unwrap().clone();
    seen.sort();
    assert_eq!(seen, ["github.com/a/b@v1.0.0", "golang.org/x/text@v0.3.0"]);
}

#[test]
fn test_dependency_edges() {
    let graph = DependencyGraph::from_go_mod_graph(GRAPH).unwrap();
    let generator = Generator::new(
        fetcher(),
        MapArchiveReader,
        LineParser,
        GeneratorOptions::default(),
    );
    let rules = generator.run(&graph).unwrap();

    let root = find(&rules, "com_github_a_b@v1.0.0");
    assert_eq!(root.kind, RuleKind::Library);
    assert_eq!(
        root.list_attr("srcs").unwrap(),
        [
            ":com_github_a_b@v1.0.0.mod[b.go]".to_string(),
            ":com_github_a_b_util@v1.0.0".to_string(),
        ]
    );
    // The root's import of its own sub-package is satisfied by nesting.
    assert!(root.list_attr("deps").unwrap().is_empty());

    let util = find(&rules, "com_github_a_b_util@v1.0.0");
    assert_eq!(
        util.list_attr("deps").unwrap(),
        ["//third-party:org_golang_x_text@v0.3.0".to_string()]
    );

    let archive = find(&rules, "com_github_a_b@v1.0.0.mod");
    assert_eq!(
        archive.list_attr("sub_targets").unwrap(),
        ["b.go".to_string(), "util/u.go".to_string()]
    );
    assert_eq!(archive.string_attr("strip_prefix"), Some("github.com/a/b@v1.0.0"));
}

#[test]
fn test_leaf_module_has_no_deps() {
    let graph = DependencyGraph::from_go_mod_graph(GRAPH).unwrap();
    let generator = Generator::new(
        fetcher(),
        MapArchiveReader,
        LineParser,
        GeneratorOptions::default(),
    );
    let rules = generator.run(&graph).unwrap();

    let text = find(&rules, "org_golang_x_text@v0.3.0");
    assert!(text.list_attr("deps").unwrap().is_empty());
}

#[test]
fn test_fetch_failure_aborts_run() {
    let graph = DependencyGraph::from_go_mod_graph(
        "example.com/main github.com/gone/away@v0.1.0\n",
    )
    .unwrap();
    let generator = Generator::new(
        MemoryFetcher::default(),
        MapArchiveReader,
        LineParser,
        GeneratorOptions::default(),
    );
    let err = generator.run(&graph).unwrap_err();
    match err {
        Error::Fetch { module, .. } => assert_eq!(module, "github.com/gone/away@v0.1.0"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_parallel_matches_sequential() {
    let graph = DependencyGraph::from_go_mod_graph(GRAPH).unwrap();

    let sequential = Generator::new(
        fetcher(),
        MapArchiveReader,
        LineParser,
        GeneratorOptions::default(),
    )
    .run(&graph)
    .unwrap();

    let parallel = Generator::new(
        fetcher(),
        MapArchiveReader,
        LineParser,
        GeneratorOptions {
            jobs: 4,
            ..GeneratorOptions::default()
        },
    )
    .run(&graph)
    .unwrap();

    assert_eq!(sequential, parallel);
}

#[test]
fn test_empty_graph_generates_nothing() {
    let graph = DependencyGraph::from_go_mod_graph("").unwrap();
    let generator = Generator::new(
        MemoryFetcher::default(),
        MapArchiveReader,
        LineParser,
        GeneratorOptions::default(),
    );
    assert!(generator.run(&graph).unwrap().is_empty());
}

#[test]
fn test_directory_name_collision_aborts_run() {
    let graph =
        DependencyGraph::from_go_mod_graph("example.com/main github.com/me/lib@v1.0.0\n").unwrap();
    let fetcher = MemoryFetcher::default().with_module(
        "github.com/me/lib@v1.0.0",
        &[("a_b/x.go", "fmt"), ("a/b/y.go", "fmt")],
    );
    let generator = Generator::new(
        fetcher,
        MapArchiveReader,
        LineParser,
        GeneratorOptions::default(),
    );
    match generator.run(&graph).unwrap_err() {
        Error::NameCollision {
            name,
            first,
            second,
        } => {
            assert_eq!(name, "com_github_me_lib_a_b@v1.0.0");
            assert_eq!(first, "github.com/me/lib/a/b");
            assert_eq!(second, "github.com/me/lib/a_b");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_module_name_collision_aborts_run() {
    let graph = DependencyGraph::from_go_mod_graph(
        "example.com/main github.com/go-yaml/yaml@v1.0.0\n\
         example.com/main github.com/go_yaml/yaml@v1.0.0\n",
    )
    .unwrap();
    let fetcher = MemoryFetcher::default()
        .with_module("github.com/go-yaml/yaml@v1.0.0", &[("yaml.go", "fmt")])
        .with_module("github.com/go_yaml/yaml@v1.0.0", &[("yaml.go", "fmt")]);
    let generator = Generator::new(
        fetcher,
        MapArchiveReader,
        LineParser,
        GeneratorOptions {
            jobs: 2,
            ..GeneratorOptions::default()
        },
    );
    match generator.run(&graph).unwrap_err() {
        Error::NameCollision {
            name,
            first,
            second,
        } => {
            assert_eq!(name, "com_github_go_yaml_yaml@v1.0.0.mod");
            assert_eq!(first, "github.com/go-yaml/yaml@v1.0.0");
            assert_eq!(second, "github.com/go_yaml/yaml@v1.0.0");
        }
        other => panic!("unexpected error: {other}"),
    }
}
