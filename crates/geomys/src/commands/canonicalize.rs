//! Print canonical rule-name fragments for module paths.

use clap::Args;
use geomys_rules::canonicalize;

#[derive(Args, Debug)]
pub struct CanonicalizeArgs {
    /// Module paths, e.g. `github.com/spf13/cobra`
    #[arg(required = true)]
    pub paths: Vec<String>,
}

pub fn run(args: &CanonicalizeArgs) -> anyhow::Result<()> {
    for path in &args.paths {
        println!("{}", canonicalize(path));
    }
    Ok(())
}
