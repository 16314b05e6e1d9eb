//! `uncommit` subcommand.

use crate::{ctx::HggContext, errors::GraphError};
use anyhow::{Context, Result};
use clap::Args;

/// CLI arguments for the `uncommit` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct UncommitCmd;

impl UncommitCmd {
    /// Run the `uncommit` subcommand.
    ///
    /// Moves every change of the current branch into the working tree on top of its parent
    /// branch, and deletes the branch.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        let repo = ctx.load_repo_data()?;
        let branch = ctx.current_branch()?;
        let node = repo.require_branch(&branch)?;
        let parent = repo
            .parent(node)
            .and_then(|p| repo.commit(p))
            .ok_or_else(|| GraphError::NoParent(branch.clone()))?;

        let patch = ctx
            .capture_patch(&branch, &["diff-index", &parent.hash, "--binary"])
            .context("getting patch")?;
        ctx.update_rev(&parent.hash, None)
            .with_context(|| format!("checking out parent `{}`", parent.short_hash))?;
        ctx.apply_patch(&patch, &[]).context("applying patch")?;
        ctx.delete_branches(std::slice::from_ref(&branch))
            .with_context(|| format!("deleting branch `{}`", branch))?;
        Ok(())
    }
}
