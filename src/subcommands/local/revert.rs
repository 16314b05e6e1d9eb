//! `revert` subcommand.

use crate::{ctx::HggContext, git::run::git_streamed_checked};
use anyhow::{Context, Result};
use clap::Args;

/// CLI arguments for the `revert` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct RevertCmd {
    /// Revision to restore the files from. `.^` is the commit of the parent branch. Without
    /// it, staged and unstaged changes are discarded.
    #[clap(short, long)]
    rev: Option<String>,
    /// Files to revert.
    #[clap(required = true)]
    paths: Vec<String>,
}

impl RevertCmd {
    /// Run the `revert` subcommand.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        let source = self
            .rev
            .as_deref()
            .map(|rev| ctx.resolve_rev(rev))
            .transpose()
            .context("resolving the revision")?;

        let mut args = vec!["restore"];
        match source.as_deref() {
            Some(source) => args.extend(["-s", source]),
            None => args.extend(["--staged", "--worktree"]),
        }
        args.extend(self.paths.iter().map(String::as_str));
        git_streamed_checked(&args).context("reverting files")?;
        Ok(())
    }
}
