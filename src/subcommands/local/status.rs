//! `status` subcommand.

use crate::{ctx::HggContext, git::run::git_streamed_checked};
use anyhow::{Context, Result};
use clap::Args;

/// CLI arguments for the `status` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct StatusCmd {
    /// List the files a branch changed since its parent branch. `.` is the current branch.
    #[clap(long)]
    change: Option<String>,
}

impl StatusCmd {
    /// Run the `status` subcommand.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        let Some(change) = self.change else {
            git_streamed_checked(&["-c", "color.ui=always", "status"])?;
            return Ok(());
        };

        let repo = ctx.load_repo_data()?;
        let branch = if change == "." {
            ctx.current_branch()?
        } else {
            change
        };
        let node = repo
            .node_by_branch(&branch)
            .or_else(|| repo.node_by_short_hash(&branch))
            .with_context(|| format!("`{}` is not a branch of the graph", branch))?;

        let base = match repo.commit(node) {
            Some(commit) if commit.is_master => format!("{}^", repo.master_branch),
            _ => repo
                .parent(node)
                .and_then(|p| repo.commit(p))
                .map(|c| c.hash.clone())
                .with_context(|| format!("`{}` has no parent branch", branch))?,
        };
        git_streamed_checked(&["diff", "--name-status", &base, &branch])?;
        Ok(())
    }
}
