//! Fetching module zips from a Go module proxy.

use crate::GoError;
use geomys_rules::synth::DEFAULT_PROXY;
use geomys_rules::{BoxError, ModuleFetcher, ModuleRef};
use std::io::Read;
use std::time::Duration;
use tracing::debug;

pub use geomys_rules::module::{escape_path, escape_version};
pub use geomys_rules::synth::archive_url;

/// Proxy base URL from a `GOPROXY` value: its first entry that is a URL.
///
/// Entries like `direct` and `off` are skipped.
pub fn proxy_from_goproxy(goproxy: &str) -> Option<String> {
    goproxy
        .split([',', '|'])
        .map(str::trim)
        .find(|entry| entry.starts_with("https://") || entry.starts_with("http://"))
        .map(|entry| entry.trim_end_matches('/').to_string())
}

/// Proxy to use when none is configured: `GOPROXY`, else proxy.golang.org.
pub fn default_proxy() -> String {
    std::env::var("GOPROXY")
        .ok()
        .and_then(|value| proxy_from_goproxy(&value))
        .unwrap_or_else(|| DEFAULT_PROXY.to_string())
}

/// Downloads module zips over HTTP.
pub struct ProxyFetcher {
    agent: ureq::Agent,
    base: String,
}

impl ProxyFetcher {
    pub fn new(base: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(30))
            .user_agent(concat!("geomys/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base: base.into(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Download the zip for `module`.
    pub fn download(&self, module: &ModuleRef) -> Result<Vec<u8>, GoError> {
        let url = archive_url(&self.base, module);
        debug!(url = %url, "downloading module");

        let response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => return Err(GoError::Http { url, status }),
            Err(ureq::Error::Transport(transport)) => {
                return Err(GoError::Transport {
                    url,
                    source: Box::new(transport),
                });
            }
        };

        let mut data = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut data)
            .map_err(|e| GoError::io(&url, e))?;
        Ok(data)
    }
}

impl ModuleFetcher for ProxyFetcher {
    fn fetch(&self, module: &ModuleRef) -> Result<Vec<u8>, BoxError> {
        Ok(self.download(module)?)
    }
}
