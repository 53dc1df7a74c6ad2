//! Go's `h1:` module hash, as recorded in `go.sum`.
//!
//! The hash is a SHA-256 over a summary listing one line per file,
//! `"<sha256 hex>  <name>\n"`, with files sorted by name. Names are the zip
//! entry names including the `path@version/` prefix.

use crate::GoError;
use crate::archive::read_entry;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use zip::ZipArchive;

/// Compute the `h1:` hash from `(name, contents)` pairs.
pub fn hash1<'a, I>(files: I) -> Result<String, GoError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut entries: Vec<(&str, &[u8])> = files.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut summary = Sha256::new();
    for (name, contents) in entries {
        if name.contains('\n') {
            return Err(GoError::Parse(format!(
                "file name {name:?} contains a newline"
            )));
        }
        summary.update(format!("{:x}  {}\n", Sha256::digest(contents), name));
    }
    Ok(format!("h1:{}", STANDARD.encode(summary.finalize())))
}

/// Compute the `h1:` hash of a module zip.
pub fn hash_zip(bytes: &[u8]) -> Result<String, GoError> {
    let mut zip = ZipArchive::new(Cursor::new(bytes))?;
    let mut files = Vec::with_capacity(zip.len());
    for idx in 0..zip.len() {
        let mut file = zip.by_index(idx)?;
        if file.is_dir() {
            continue;
        }
        let size = file.size();
        let data = read_entry(&mut file, size).map_err(|e| GoError::io(file.name(), e))?;
        files.push((file.name().to_string(), data));
    }
    hash1(files.iter().map(|(n, d)| (n.as_str(), d.as_slice())))
}
