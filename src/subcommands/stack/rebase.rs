//! `rebase` subcommand.

use crate::{
    ctx::HggContext,
    tree::traversal::{merge_order_onto, rebase_order},
};
use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

/// CLI arguments for the `rebase` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct RebaseCmd {
    /// Branch (or commit of a branch) to move, along with its descendants.
    #[clap(short, long)]
    source: String,
    /// Branch (or commit of a branch) to move onto.
    #[clap(short, long)]
    dest: String,
}

impl RebaseCmd {
    /// Run the `rebase` subcommand.
    ///
    /// A stack root is moved with merges, which keeps its pushed history intact. A branch in
    /// the middle of a stack is rebased.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        let repo = ctx.load_repo_data()?;
        let current = ctx.current_branch()?;

        let source = ctx
            .require_branch_name(&self.source)
            .with_context(|| format!("resolving `{}` to a branch", self.source))?;
        let dest = ctx
            .require_branch_name(&self.dest)
            .with_context(|| format!("resolving `{}` to a branch", self.dest))?;
        let source_node = repo.require_branch(&source)?;
        let dest_node = repo.require_branch(&dest)?;

        let is_stack_root = repo
            .parent(source_node)
            .and_then(|p| repo.commit(p))
            .is_some_and(|c| c.is_effective_master());
        if is_stack_root {
            info!(source = %source, dest = %dest, "Moving stack root with merges");
            let merges = merge_order_onto(&repo, source_node, dest_node)?;
            ctx.execute_merges(&merges)
                .context("rebasing root of stack")?;
        } else {
            info!(source = %source, dest = %dest, "Rebasing middle of stack");
            let rebases = rebase_order(&repo, source_node, dest_node)?;
            ctx.execute_rebases(&rebases)
                .context("rebasing middle of stack")?;
        }

        ctx.switch(&current)
            .with_context(|| format!("checking out original branch `{}`", current))?;
        Ok(())
    }
}
