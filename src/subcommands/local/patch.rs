//! `patch` subcommand.

use crate::ctx::HggContext;
use anyhow::{Context, Result};
use clap::Args;

/// CLI arguments for the `patch` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct PatchCmd {
    /// Commit whose changes to apply.
    #[clap(index = 1)]
    rev: String,
    /// Apply what applies and leave rejected hunks in `.rej` files.
    #[clap(short, long)]
    force: bool,
}

impl PatchCmd {
    /// Run the `patch` subcommand: apply the changes of a commit as uncommitted changes.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        let parent = format!("{}^", self.rev);
        let patch = ctx
            .capture_patch(&self.rev, &["diff", "--binary", &parent, &self.rev])
            .with_context(|| format!("getting the patch of `{}`", self.rev))?;

        let reject = if self.force { "--reject" } else { "--no-reject" };
        ctx.apply_patch(&patch, &[reject])
            .with_context(|| format!("applying the patch of `{}`", self.rev))?;
        Ok(())
    }
}
