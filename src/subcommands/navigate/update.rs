//! `update` subcommand.

use crate::ctx::HggContext;
use anyhow::{Context, Result};
use clap::Args;

/// CLI arguments for the `update` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct UpdateCmd {
    /// Branch name or commit hash to check out. Snaps to a branch when one points at it.
    #[clap(index = 1)]
    rev: String,
}

impl UpdateCmd {
    /// Run the `update` subcommand.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        ctx.update_rev(&self.rev, None)
            .with_context(|| format!("checking out `{}`", self.rev))
    }
}
