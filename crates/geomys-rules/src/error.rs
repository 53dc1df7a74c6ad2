/// Error returned by the injected collaborators (fetcher, archive reader, parser).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that abort rule generation.
///
/// Every variant is fatal for the run: generated dependency edges are only
/// useful when they are complete, so nothing is emitted after a failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed graph line {line}: expected `from@version to@version`, got {text:?}")]
    MalformedGraphLine { line: usize, text: String },

    #[error("invalid module key {0:?}: expected `path@version`")]
    InvalidModuleKey(String),

    #[error("failed to fetch {module}")]
    Fetch {
        module: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to read archive of {module}")]
    Archive {
        module: String,
        #[source]
        source: BoxError,
    },

    #[error("failed to parse imports of {file} in {module}")]
    ImportParse {
        module: String,
        file: String,
        #[source]
        source: BoxError,
    },

    #[error("rule name {name:?} generated for both {first} and {second}")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("failed to start worker pool")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
