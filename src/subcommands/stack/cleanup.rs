//! `cleanup` subcommand.

use crate::{ctx::HggContext, errors::GraphError, tree::traversal::cleanup_merge_order};
use anyhow::{Context, Result};
use clap::Args;
use nu_ansi_term::Color;

/// CLI arguments for the `cleanup` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct CleanupCmd;

impl CleanupCmd {
    /// Run the `cleanup` subcommand.
    ///
    /// Deletes the local branches whose remote branch was deleted, and merges master into the
    /// branches that were stacked on them.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        let current = ctx.current_branch()?;
        let pruned = ctx
            .prune_remote()
            .context("pruning remote-tracking branches")?;

        let repo = ctx.load_repo_data().context("building the branch graph")?;
        let master = repo
            .master_node()
            .ok_or_else(|| GraphError::UnknownBranch(repo.master_branch.clone()))?;

        let mut plans = Vec::new();
        for branch in &pruned {
            let Some(node) = repo.node_by_branch(branch) else {
                continue;
            };
            let merges = cleanup_merge_order(&repo, node, master).with_context(|| {
                format!("finding the restack order for pruned branch `{}`", branch)
            })?;
            plans.push((branch, merges));
        }

        ctx.pull().context("pulling the latest master")?;

        for (branch, merges) in plans {
            println!("{}", Color::Green.paint(format!("Pruning branch: {}", branch)));
            ctx.delete_branches(std::slice::from_ref(branch))
                .with_context(|| format!("deleting local pruned branch `{}`", branch))?;
            ctx.execute_merges(&merges)
                .with_context(|| format!("restacking descendants of `{}`", branch))?;
        }

        let target = if pruned.contains(&current) {
            repo.master_branch.as_str()
        } else {
            current.as_str()
        };
        ctx.update_rev(target, None)?;
        Ok(())
    }
}
