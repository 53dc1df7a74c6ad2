//! Configuration for geomys.
//!
//! Loads config from:
//! 1. Global: ~/.config/geomys/config.toml
//! 2. Per-project: <root>/.geomys/config.toml (overrides global)
//!
//! Command-line flags override both.
//!
//! Example config.toml:
//! ```toml
//! [proxy]
//! url = "https://goproxy.example.com"
//!
//! [fetch]
//! cache = true
//! verify = true
//! jobs = 8
//!
//! [output]
//! buck_file = "third-party/BUCK"
//! package = "//third-party"
//! ```

use anyhow::Context;
use geomys_rules::synth::DEFAULT_PACKAGE;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_BUCK_FILE: &str = "third-party/BUCK";

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    /// Module proxy base URL.
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Keep downloaded module zips on disk.
    pub cache: Option<bool>,
    pub cache_dir: Option<PathBuf>,
    /// Check downloads against go.sum.
    pub verify: Option<bool>,
    /// Modules processed concurrently.
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// BUCK file to write, relative to the project root.
    pub buck_file: Option<PathBuf>,
    /// Buck package holding the generated rules.
    pub package: Option<String>,
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct GeomysConfig {
    pub proxy: ProxyConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
}

impl GeomysConfig {
    /// Load global config, then merge the project config over it.
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path()
            && let Some(global) = Self::load_file(&global_path)?
        {
            config = config.merge(global);
        }

        let project_path = root.join(".geomys").join("config.toml");
        if let Some(project) = Self::load_file(&project_path)? {
            config = config.merge(project);
        }

        Ok(config)
    }

    fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("geomys").join("config.toml"))
    }

    /// Parse `path`; a missing file is not an error, a malformed one is.
    fn load_file(path: &Path) -> anyhow::Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        debug!(path = %path.display(), "loaded config");
        let config = toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(Some(config))
    }

    /// Field-by-field merge; values set in `other` win.
    pub fn merge(self, other: Self) -> Self {
        Self {
            proxy: ProxyConfig {
                url: other.proxy.url.or(self.proxy.url),
            },
            fetch: FetchConfig {
                cache: other.fetch.cache.or(self.fetch.cache),
                cache_dir: other.fetch.cache_dir.or(self.fetch.cache_dir),
                verify: other.fetch.verify.or(self.fetch.verify),
                jobs: other.fetch.jobs.or(self.fetch.jobs),
            },
            output: OutputConfig {
                buck_file: other.output.buck_file.or(self.output.buck_file),
                package: other.output.package.or(self.output.package),
            },
        }
    }

    pub fn proxy_url(&self) -> String {
        self.proxy
            .url
            .clone()
            .unwrap_or_else(geomys_gomod::proxy::default_proxy)
    }

    pub fn cache_enabled(&self) -> bool {
        self.fetch.cache.unwrap_or(true)
    }

    pub fn cache_dir(&self) -> Option<PathBuf> {
        self.fetch
            .cache_dir
            .clone()
            .or_else(geomys_gomod::cache::default_cache_dir)
    }

    pub fn verify(&self) -> bool {
        self.fetch.verify.unwrap_or(true)
    }

    /// Configured job count, else the available parallelism.
    pub fn jobs(&self) -> usize {
        self.fetch.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1)
        })
    }

    pub fn buck_file(&self) -> PathBuf {
        self.output
            .buck_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUCK_FILE))
    }

    pub fn package(&self) -> String {
        self.output
            .package
            .clone()
            .unwrap_or_else(|| DEFAULT_PACKAGE.to_string())
    }
}
