//! `add` subcommand.

use crate::{ctx::HggContext, git::run::git_streamed_checked};
use anyhow::Result;
use clap::Args;

/// CLI arguments for the `add` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct AddCmd {
    /// Paths to stage.
    #[clap(required = true)]
    paths: Vec<String>,
}

impl AddCmd {
    /// Run the `add` subcommand.
    pub fn run(self, _: HggContext<'_>) -> Result<()> {
        let mut args = vec!["add"];
        args.extend(self.paths.iter().map(String::as_str));
        git_streamed_checked(&args)?;
        Ok(())
    }
}
