//! `pull` subcommand.

use crate::ctx::HggContext;
use anyhow::{Context, Result};
use clap::Args;

/// CLI arguments for the `pull` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct PullCmd;

impl PullCmd {
    /// Run the `pull` subcommand: fetch master from the remote into the local master branch.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        ctx.pull().context("fetching master")
    }
}
