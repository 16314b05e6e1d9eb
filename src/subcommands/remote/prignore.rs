//! `prignore` subcommand.

use crate::ctx::HggContext;
use anyhow::{Context, Result};
use clap::Args;

/// CLI arguments for the `prignore` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct PrignoreCmd {
    /// Branch to exclude from `submit`.
    #[clap(index = 1)]
    branch: String,
    /// Include the branch again.
    #[clap(short, long)]
    off: bool,
}

impl PrignoreCmd {
    /// Run the `prignore` subcommand.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        ctx.set_pr_ignored(&self.branch, !self.off)
            .with_context(|| format!("updating the prignore flag of `{}`", self.branch))
    }
}
