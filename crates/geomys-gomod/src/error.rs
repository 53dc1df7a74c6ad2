use std::path::PathBuf;

/// Errors from the Go toolchain, the module proxy, and module archives.
#[derive(Debug, thiserror::Error)]
pub enum GoError {
    #[error("`{command}` failed: {stderr}")]
    ToolFailed { command: String, stderr: String },

    #[error("request to {url} failed with status {status}")]
    Http { url: String, status: u16 },

    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Transport>,
    },

    #[error("invalid module archive")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checksum mismatch for {module}: go.sum has {expected}, downloaded archive is {actual}")]
    ChecksumMismatch {
        module: String,
        expected: String,
        actual: String,
    },

    #[error("{0}")]
    Parse(String),
}

impl GoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GoError::Io {
            path: path.into(),
            source,
        }
    }
}
