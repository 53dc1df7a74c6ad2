//! Print the `h1:` hash of a module zip.

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct HashArgs {
    /// Module zip as served by a module proxy
    pub zip: PathBuf,
}

pub fn run(args: &HashArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.zip)
        .with_context(|| format!("failed to read {}", args.zip.display()))?;
    let hash = geomys_gomod::hash_zip(&bytes)
        .with_context(|| format!("failed to hash {}", args.zip.display()))?;
    println!("{hash}");
    Ok(())
}
