//! `next`, `prev` and `top` subcommands.

use crate::{
    ctx::HggContext,
    errors::GraphError,
    tree::{traversal, NodeId, RepoData},
};
use anyhow::Result;
use clap::Args;
use tracing::debug;

/// Loads the graph and checks out the node `pick` chooses from the current branch.
fn move_from_current(
    ctx: &HggContext<'_>,
    pick: fn(&RepoData, NodeId) -> Result<NodeId, GraphError>,
) -> Result<()> {
    let repo = ctx.load_repo_data()?;
    let current = ctx.current_branch()?;
    let target = pick(&repo, repo.require_branch(&current)?)?;
    let commit = repo
        .commit(target)
        .ok_or_else(|| GraphError::NoParent(current.clone()))?;
    debug!(from = %current, to = %commit.short_hash, "Moving");
    ctx.update_rev(&commit.hash, None)?;
    Ok(())
}

/// CLI arguments for the `next` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct NextCmd;

impl NextCmd {
    /// Run the `next` subcommand: check out the only child branch.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        move_from_current(&ctx, traversal::next)
    }
}

/// CLI arguments for the `prev` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct PrevCmd;

impl PrevCmd {
    /// Run the `prev` subcommand: check out the parent branch.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        move_from_current(&ctx, traversal::prev)
    }
}

/// CLI arguments for the `top` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct TopCmd;

impl TopCmd {
    /// Run the `top` subcommand: follow single children up to the top of the stack.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        move_from_current(&ctx, traversal::top)
    }
}
