//! `amend` subcommand.

use crate::{ctx::HggContext, tree::traversal::merge_order};
use anyhow::{Context, Result};
use clap::Args;

/// CLI arguments for the `amend` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct AmendCmd {
    /// Message of the new commit.
    #[clap(short, long, conflicts_with = "force", required_unless_present = "force")]
    message: Option<String>,
    /// Commit with the configured default message.
    #[clap(short, long)]
    force: bool,
}

impl AmendCmd {
    /// Run the `amend` subcommand.
    ///
    /// Commits every change as a new commit on the current branch, then merges it down into
    /// every descendant branch.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        let message = match self.message {
            Some(message) => message,
            None => ctx.config.amend_message.clone(),
        };

        let branch = ctx.current_branch()?;
        let repo = ctx.load_repo_data()?;
        let merges = merge_order(&repo, repo.require_branch(&branch)?)
            .context("finding the restack order")?;

        ctx.commit_all(&message).context("committing")?;
        ctx.execute_merges(&merges).context("restacking descendants")?;
        ctx.switch(&branch)
            .with_context(|| format!("checking out original branch `{}`", branch))?;
        Ok(())
    }
}
