//! BUCK file handling for geomys.
//!
//! Generated rules are merged into an existing build file rather than
//! overwriting it: rules are matched by `name`, hand-written statements are
//! preserved, and the result is printed in a stable canonical form.

pub mod format;
pub mod merge;
pub mod syntax;

pub use format::format;
pub use merge::{merge_into_file, merge_rules};
pub use syntax::{BuildFile, Rule, Stmt, Value, parse};

/// Build file text that cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("line {line}: syntax error")]
    Invalid { line: usize },

    #[error("failed to load Starlark grammar: {0}")]
    Grammar(String),
}
