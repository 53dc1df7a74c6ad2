//! Obtaining `go mod graph` output.

use crate::GoError;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Run `go mod graph` in `root` and return its stdout.
pub fn go_mod_graph(root: &Path) -> Result<String, GoError> {
    debug!(root = %root.display(), "running go mod graph");
    let output = Command::new("go")
        .args(["mod", "graph"])
        .current_dir(root)
        .output()
        .map_err(|e| GoError::ToolFailed {
            command: "go mod graph".to_string(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(GoError::ToolFailed {
            command: "go mod graph".to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    String::from_utf8(output.stdout)
        .map_err(|_| GoError::Parse("go mod graph printed non-UTF-8 output".to_string()))
}

/// Read previously saved `go mod graph` output.
pub fn read_graph_file(path: &Path) -> Result<String, GoError> {
    std::fs::read_to_string(path).map_err(|e| GoError::io(path, e))
}
