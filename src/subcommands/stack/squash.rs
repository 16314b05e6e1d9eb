//! `squash` subcommand.

use crate::{
    ctx::HggContext,
    errors::GraphError,
    git::{
        run::{git, git_output, git_streamed_checked},
        RepositoryExt,
    },
    tree::{NodeId, RepoData},
};
use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::debug;

/// CLI arguments for the `squash` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct SquashCmd {
    /// Branch to squash. Defaults to the current branch.
    #[clap(index = 1)]
    branch: Option<String>,
    /// Squash even if commits were pushed, and squash every descendant branch too.
    #[clap(short, long)]
    force: bool,
}

/// What to squash for one branch.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SquashPlan {
    /// The diff against this commit becomes the squashed commit.
    patch_from: String,
    /// Branch the squashed commit is created on.
    parent_branch: String,
    message: String,
}

impl SquashCmd {
    /// Run the `squash` subcommand.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        let repo = ctx.load_repo_data()?;
        let current = ctx.current_branch()?;
        let branch = self.branch.clone().unwrap_or_else(|| current.clone());

        let last = self
            .squash_with_descendants(&ctx, &repo, &branch)
            .with_context(|| format!("squashing branch `{}` and its descendants", branch))?;

        if last != current {
            ctx.update_rev(&current, None)
                .with_context(|| format!("checking out original branch `{}`", current))?;
        }
        Ok(())
    }

    /// Squashes `branch`, then its descendants depth-first. Returns the last branch squashed.
    fn squash_with_descendants(
        &self,
        ctx: &HggContext<'_>,
        repo: &RepoData,
        branch: &str,
    ) -> Result<String> {
        let node = repo.require_branch(branch)?;
        if repo.children(node).next().is_some() && !self.force {
            bail!(
                "not squashing since branch `{}` has descendant branches. Pass -f to squash it and its descendants.",
                branch
            );
        }

        self.squash_branch(ctx, repo, node, branch)?;

        let mut last = branch.to_string();
        for child in repo.children(node) {
            let child_branch = repo
                .commit(child)
                .ok_or_else(|| GraphError::NoBranchName("root".to_string()))?
                .branch_name()?
                .to_string();
            last = self
                .squash_with_descendants(ctx, repo, &child_branch)
                .with_context(|| format!("squashing child branch `{}`", child_branch))?;
        }
        Ok(last)
    }

    fn squash_branch(
        &self,
        ctx: &HggContext<'_>,
        repo: &RepoData,
        node: NodeId,
        branch: &str,
    ) -> Result<()> {
        ctx.update_rev(branch, None)?;
        let plan = self.plan(ctx, repo, node, branch)?;
        debug!(?plan, branch, "Squashing");

        let patch = ctx
            .capture_patch(branch, &["diff-index", &plan.patch_from, "--binary"])
            .context("getting patch")?;

        ctx.update_rev(&plan.parent_branch, None)
            .with_context(|| format!("checking out parent branch `{}`", plan.parent_branch))?;
        git_streamed_checked(&["switch", "-C", branch])
            .with_context(|| format!("recreating branch `{}` at its parent", branch))?;
        ctx.apply_patch(&patch, &[]).context("applying patch")?;
        ctx.commit_all(&plan.message).context("committing")?;
        Ok(())
    }

    /// Decides which commits of `branch` are safe to squash.
    ///
    /// Without a remote-tracking branch every commit is local. When the remote-tracking branch
    /// is an ancestor of the tip, only the unpushed commits are squashed. A remote-tracking
    /// branch off the branch's history is left over from an earlier squash and ignored.
    fn plan(
        &self,
        ctx: &HggContext<'_>,
        repo: &RepoData,
        node: NodeId,
        branch: &str,
    ) -> Result<SquashPlan> {
        let commit = repo
            .commit(node)
            .ok_or_else(|| GraphError::UnknownBranch(branch.to_string()))?;
        let parent = repo
            .parent(node)
            .and_then(|p| repo.commit(p))
            .ok_or_else(|| GraphError::NoParent(branch.to_string()))?;

        let whole_branch = SquashPlan {
            patch_from: parent.hash.clone(),
            parent_branch: parent.branch_name()?.to_string(),
            message: commit.display_title().to_string(),
        };

        let remote_tip = ctx
            .repository
            .remote_branch_tip(&ctx.config.remote, branch)?;
        let remote_tip = match remote_tip {
            Some(tip) if !self.force => tip,
            _ => return Ok(whole_branch),
        };
        if remote_tip == commit.hash {
            bail!("not squashing since all commits on the branch have already been pushed. Pass -f to force a squash.");
        }

        let range = format!("{}..{}", remote_tip, commit.hash);
        if !git(&["log", "--merges", &range])?.trim().is_empty() {
            bail!("not squashing since there are merge commits on the branch after the commit has been pushed. Pass -f to force a squash.");
        }

        let is_ancestor = git_output(&["merge-base", "--is-ancestor", &remote_tip, &commit.hash])?
            .status
            .success();
        if !is_ancestor {
            return Ok(whole_branch);
        }

        let message = git(&["log", "--pretty=format:%s", "--reverse", &range])?
            .trim()
            .to_string();
        Ok(SquashPlan {
            patch_from: remote_tip,
            message,
            ..whole_branch
        })
    }
}
