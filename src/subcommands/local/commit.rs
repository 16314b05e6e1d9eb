//! `commit` subcommand.

use crate::{
    ctx::HggContext,
    git::{
        description::{get_description_or_fallback, set_description},
        RepositoryExt,
    },
};
use anyhow::{Context, Result};
use clap::Args;
use tracing::debug;

/// CLI arguments for the `commit` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct CommitCmd {
    /// Commit message.
    #[clap(short, long)]
    message: String,
}

impl CommitCmd {
    /// Run the `commit` subcommand.
    ///
    /// Stages and commits everything. The first commit of a branch other than master also seeds
    /// the branch description from the commit title.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        let branch = ctx.current_branch()?;
        let master = ctx.master_branch()?;

        ctx.commit_all(&self.message).context("committing")?;
        if branch == master {
            return Ok(());
        }

        let title = ctx.repository.branch_tip_title(&branch)?;
        let description = get_description_or_fallback(ctx.repository, &branch, &title)?;
        if !description.is_stored() {
            debug!(branch = %branch, "Seeding branch description");
            set_description(ctx.repository, &branch, description.description())
                .context("writing branch description")?;
        }
        Ok(())
    }
}
