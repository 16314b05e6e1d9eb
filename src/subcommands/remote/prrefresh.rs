//! `prrefresh` subcommand.

use super::prsync::sync_description;
use crate::{ctx::HggContext, github::GhClient};
use anyhow::{Context, Result};
use clap::Args;

/// CLI arguments for the `prrefresh` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct PrrefreshCmd;

impl PrrefreshCmd {
    /// Run the `prrefresh` subcommand: `prget` then `prsync` on the current branch.
    pub async fn run(self, ctx: HggContext<'_>) -> Result<()> {
        let branch = ctx.current_branch()?;
        let mut gh = GhClient::new();
        gh.checkout(&branch)
            .await
            .with_context(|| format!("checking out the PR of `{}`", branch))?;
        sync_description(&ctx, &mut gh, &branch)
            .await
            .with_context(|| format!("syncing the PR of `{}`", branch))
    }
}
